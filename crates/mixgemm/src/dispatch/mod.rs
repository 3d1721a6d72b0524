//! Type dispatch: from runtime format tags to a typed problem.
//!
//! A request names its formats at runtime. Dispatch turns it into a
//! [`ContractionProblem`] in three steps:
//!
//! 1. [`lookup`] resolves the [`TypeTuple`](crate::types::TypeTuple) against
//!    [`CATALOG`] and yields a [`Kernel`]. Unknown tuples fail with
//!    [`GemmError::NotImplemented`](crate::GemmError::NotImplemented).
//! 2. [`with_kernel_types!`](crate::with_kernel_types) instantiates the
//!    generic builder with the kernel's concrete types.
//! 3. The builder casts the A, B, C and D addresses with [`TypedPtr::cast`],
//!    which rejects misaligned addresses, and assembles the descriptor.
//!    Without strided batches each address is a pointer array and is
//!    checked against pointer alignment instead.
//!
//! # Catalog
//!
//! | A | B | C = D | Compute |
//! |---|---|-------|---------|
//! | f32 | f32 | f32 | f32, f32 fast-xf32 |
//! | f64 | f64 | f64 | f64 |
//! | f16 | f16 | f16, f32 | f32 |
//! | bf16 | bf16 | bf16 | f32 |
//! | e4m3 | e4m3 | f32, f16 | f32 |
//! | e4m3 | e5m2 | f32, f16 | f32 |
//! | e5m2 | e4m3 | f32, f16 | f32 |
//! | i8 | i8 | i8, i32 | i32 |
//! | f16 | e4m3 | e4m3, f16, f32 | f32 fast-f16 |
//! | e4m3 | f16 | e4m3, f16, f32 | f32 fast-f16 |

mod catalog;
mod ptr;

pub use catalog::{lookup, Kernel, KernelSignature, CATALOG};
pub use ptr::{DevicePtr, TypedPtr};

use crate::api::{MatmulArgs, MatrixRef};
use crate::error::{Operand, Result};
use crate::problem::{ContractionProblem, TensorDesc};
use crate::types::{ComputeScalar, Element, KernelDataType};

/// How alpha is filled in when a per-row alpha vector is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AlphaPolicy {
    /// Forward the caller's alpha pointer.
    AsGiven,
    /// Point alpha at a static one so the vector alone scales the rows.
    UnitWithVector,
}

/// Build the descriptor for one request with `kernel`'s concrete types.
pub(crate) fn build_problem(
    kernel: Kernel,
    args: &MatmulArgs,
    policy: AlphaPolicy,
) -> Result<ContractionProblem> {
    crate::with_kernel_types!(kernel, <TiA, TiB, To, Tc> => {
        build_typed::<TiA, TiB, To, Tc>(kernel, args, policy)
    })
}

fn build_typed<TiA, TiB, To, Tc>(
    kernel: Kernel,
    args: &MatmulArgs,
    policy: AlphaPolicy,
) -> Result<ContractionProblem>
where
    TiA: Element,
    TiB: Element,
    To: Element,
    Tc: ComputeScalar,
{
    let strided = args.strided_batch;
    let a = describe::<TiA>(&args.a, Operand::A, strided)?;
    let b = describe::<TiB>(&args.b, Operand::B, strided)?;
    let c = describe::<To>(&args.c, Operand::C, strided)?;
    let d = describe::<To>(&args.d, Operand::D, strided)?;

    // E is forwarded untyped, in D's format
    let e_type = KernelDataType::from(args.types.d);
    let e = if strided {
        TensorDesc::column_major(e_type, args.e.ptr, args.e.ld, args.e.batch_stride)
    } else {
        TensorDesc::pointer_array(e_type, args.e.ptr, args.e.ld)
    };

    let alpha = match policy {
        AlphaPolicy::UnitWithVector if !args.scales.alpha_vec.is_null() => Tc::one_ptr(),
        _ => args.alpha,
    };

    Ok(ContractionProblem {
        kernel,
        types: args.types,
        trans_a: args.trans_a,
        trans_b: args.trans_b,
        m: args.m,
        n: args.n,
        k: args.k,
        alpha,
        beta: args.beta,
        scalar: Tc::KIND,
        a,
        b,
        c,
        d,
        e,
        batch_count: args.batch_count,
        strided_batch: strided,
        grouped_gemm: args.grouped_gemm,
        gradient: args.gradient,
        compute_type: args.types.compute,
        bias: args.bias,
        bias_type: args.bias_type,
        scales: args.scales,
        epilogue: args.epilogue,
        workspace: args.workspace,
        workspace_size: args.workspace_size,
    })
}

fn describe<T: Element>(matrix: &MatrixRef, operand: Operand, strided: bool) -> Result<TensorDesc> {
    let data_type = KernelDataType::from(T::DATA_TYPE);
    if strided {
        let ptr = TypedPtr::<T>::cast(matrix.ptr, operand)?;
        Ok(TensorDesc::column_major(data_type, ptr.erase(), matrix.ld, matrix.batch_stride))
    } else {
        let array = TypedPtr::<*const T>::cast(matrix.ptr, operand)?;
        Ok(TensorDesc::pointer_array(data_type, array.erase(), matrix.ld))
    }
}

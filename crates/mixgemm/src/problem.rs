//! The canonical, format-erased problem description handed to backends.
//!
//! A [`ContractionProblem`] is built by the dispatcher right before a
//! backend call. Its operand addresses have already passed the typed
//! alignment check, and its [`Kernel`] records which concrete types the
//! addresses hold.
//!
//! All matrices are column-major: element `(i, j)` of an operand lives at
//! `i * row_stride + j * col_stride`, with `row_stride == 1`.
//!
//! Batches are either strided (`ptr` plus `batch_stride` per batch) or
//! addressed through a per-batch pointer array (`batch_ptrs`, with `ptr`
//! null and `batch_stride` zero).

use crate::dispatch::{DevicePtr, Kernel};
use crate::types::{
    ComputeType, DataType, Epilogue, KernelDataType, Operation, ScalarKind, TypeTuple,
};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Layout of one operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TensorDesc {
    /// Element format in the backend's vocabulary.
    pub data_type: KernelDataType,
    pub ptr: DevicePtr,
    /// Per-batch pointer array, used when the batch is not strided.
    pub batch_ptrs: DevicePtr,
    pub row_stride: usize,
    pub col_stride: usize,
    pub batch_stride: usize,
}

impl TensorDesc {
    /// Column-major layout with leading dimension `ld`, batches `batch_stride`
    /// elements apart.
    pub fn column_major(
        data_type: KernelDataType,
        ptr: DevicePtr,
        ld: usize,
        batch_stride: usize,
    ) -> Self {
        Self {
            data_type,
            ptr,
            batch_ptrs: DevicePtr::NULL,
            row_stride: 1,
            col_stride: ld,
            batch_stride,
        }
    }

    /// Column-major layout whose batches are listed in a pointer array.
    pub fn pointer_array(data_type: KernelDataType, batch_ptrs: DevicePtr, ld: usize) -> Self {
        Self {
            data_type,
            ptr: DevicePtr::NULL,
            batch_ptrs,
            row_stride: 1,
            col_stride: ld,
            batch_stride: 0,
        }
    }

    /// Leading dimension.
    #[inline]
    pub fn ld(&self) -> usize {
        self.col_stride
    }
}

/// Optional scale factors attached to a problem.
///
/// Each pointer addresses host scalars of the problem's [`ScalarKind`].
/// `alpha_vec` holds one alpha per output row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScalePtrs {
    pub a: DevicePtr,
    pub b: DevicePtr,
    pub c: DevicePtr,
    pub d: DevicePtr,
    pub e: DevicePtr,
    pub alpha_vec: DevicePtr,
}

/// One fully resolved multiplication:
/// `D = scale_d * (alpha * op(A) * op(B) + beta * C)` followed by the epilogue.
#[derive(Debug, Clone, PartialEq)]
pub struct ContractionProblem {
    pub kernel: Kernel,
    pub types: TypeTuple,
    pub trans_a: Operation,
    pub trans_b: Operation,
    pub m: usize,
    pub n: usize,
    pub k: usize,
    pub alpha: DevicePtr,
    pub beta: DevicePtr,
    pub scalar: ScalarKind,
    pub a: TensorDesc,
    pub b: TensorDesc,
    pub c: TensorDesc,
    pub d: TensorDesc,
    /// Auxiliary output written by `*Aux` epilogues.
    pub e: TensorDesc,
    pub batch_count: usize,
    pub strided_batch: bool,
    pub grouped_gemm: bool,
    pub gradient: bool,
    pub compute_type: ComputeType,
    pub bias: DevicePtr,
    pub bias_type: DataType,
    pub scales: ScalePtrs,
    pub epilogue: Epilogue,
    pub workspace: DevicePtr,
    pub workspace_size: usize,
}

impl ContractionProblem {
    /// Whether batches are addressed through pointer arrays.
    ///
    /// Requires the non-strided mode and no batch stride on any of A, B, C
    /// and D.
    pub fn uses_batch_pointers(&self) -> bool {
        !self.strided_batch
            && [&self.a, &self.b, &self.c, &self.d]
                .iter()
                .all(|t| t.batch_stride == 0)
    }

    /// Arithmetic operations across all batches, counting multiply and add.
    pub fn flops(&self) -> u64 {
        2 * self.m as u64 * self.n as u64 * self.k as u64 * self.batch_count as u64
    }
}

/// Whether an instance holds a single problem or a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GemmType {
    Gemm,
    GroupedGemm,
}

/// Backend-owned state for a pre-staged problem or group.
#[derive(Clone)]
pub struct GemmData(Arc<dyn Any + Send + Sync>);

impl GemmData {
    pub fn new<T: Any + Send + Sync>(inner: T) -> Self {
        Self(Arc::new(inner))
    }

    /// Borrow the backend's state, if it has type `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl fmt::Debug for GemmData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("GemmData(..)")
    }
}

/// Result of a create call: backend state plus the number of problems.
#[derive(Debug, Clone)]
pub struct GemmInstance {
    pub gemm_type: GemmType,
    pub data: GemmData,
    pub count: usize,
}

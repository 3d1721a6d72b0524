//! The finite set of supported format combinations.

use crate::error::{GemmError, Result};
use crate::types::{ComputeType, DataType, ScalarKind, TypeTuple};
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// A statically specialized GEMM path.
///
/// Each variant fixes the concrete A, B, output (C and D) and scalar types;
/// [`with_kernel_types!`](crate::with_kernel_types) binds them for generic
/// code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kernel {
    F32,
    F64,
    F16,
    F16ToF32,
    Bf16,
    E4m3E4m3ToF32,
    E4m3E4m3ToF16,
    E4m3E5m2ToF32,
    E4m3E5m2ToF16,
    E5m2E4m3ToF32,
    E5m2E4m3ToF16,
    I8ToI8,
    I8ToI32,
    F16E4m3ToE4m3,
    F16E4m3ToF16,
    F16E4m3ToF32,
    E4m3F16ToE4m3,
    E4m3F16ToF16,
    E4m3F16ToF32,
}

/// Concrete formats a [`Kernel`] is specialized for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelSignature {
    pub a: DataType,
    pub b: DataType,
    pub out: DataType,
    pub scalar: ScalarKind,
}

impl Kernel {
    pub fn signature(self) -> KernelSignature {
        use DataType::*;
        let (a, b, out, scalar) = match self {
            Kernel::F32 => (F32, F32, F32, ScalarKind::F32),
            Kernel::F64 => (F64, F64, F64, ScalarKind::F64),
            Kernel::F16 => (F16, F16, F16, ScalarKind::F32),
            Kernel::F16ToF32 => (F16, F16, F32, ScalarKind::F32),
            Kernel::Bf16 => (Bf16, Bf16, Bf16, ScalarKind::F32),
            Kernel::E4m3E4m3ToF32 => (F8E4M3, F8E4M3, F32, ScalarKind::F32),
            Kernel::E4m3E4m3ToF16 => (F8E4M3, F8E4M3, F16, ScalarKind::F32),
            Kernel::E4m3E5m2ToF32 => (F8E4M3, F8E5M2, F32, ScalarKind::F32),
            Kernel::E4m3E5m2ToF16 => (F8E4M3, F8E5M2, F16, ScalarKind::F32),
            Kernel::E5m2E4m3ToF32 => (F8E5M2, F8E4M3, F32, ScalarKind::F32),
            Kernel::E5m2E4m3ToF16 => (F8E5M2, F8E4M3, F16, ScalarKind::F32),
            Kernel::I8ToI8 => (I8, I8, I8, ScalarKind::I32),
            Kernel::I8ToI32 => (I8, I8, I32, ScalarKind::I32),
            Kernel::F16E4m3ToE4m3 => (F16, F8E4M3, F8E4M3, ScalarKind::F32),
            Kernel::F16E4m3ToF16 => (F16, F8E4M3, F16, ScalarKind::F32),
            Kernel::F16E4m3ToF32 => (F16, F8E4M3, F32, ScalarKind::F32),
            Kernel::E4m3F16ToE4m3 => (F8E4M3, F16, F8E4M3, ScalarKind::F32),
            Kernel::E4m3F16ToF16 => (F8E4M3, F16, F16, ScalarKind::F32),
            Kernel::E4m3F16ToF32 => (F8E4M3, F16, F32, ScalarKind::F32),
        };
        KernelSignature { a, b, out, scalar }
    }
}

macro_rules! catalog {
    ($($a:ident, $b:ident => $out:ident @ $compute:ident => $kernel:ident;)*) => {
        &[
            $(
                (
                    TypeTuple::uniform_output(
                        DataType::$a,
                        DataType::$b,
                        DataType::$out,
                        ComputeType::$compute,
                    ),
                    Kernel::$kernel,
                ),
            )*
        ]
    };
}

/// Every accepted format tuple and the kernel it selects.
pub const CATALOG: &[(TypeTuple, Kernel)] = catalog! {
    F32, F32 => F32 @ F32 => F32;
    F32, F32 => F32 @ F32FastXf32 => F32;
    F16, F16 => F16 @ F32 => F16;
    F16, F16 => F32 @ F32 => F16ToF32;
    Bf16, Bf16 => Bf16 @ F32 => Bf16;
    F8E4M3, F8E4M3 => F32 @ F32 => E4m3E4m3ToF32;
    F8E4M3, F8E4M3 => F16 @ F32 => E4m3E4m3ToF16;
    F8E4M3, F8E5M2 => F32 @ F32 => E4m3E5m2ToF32;
    F8E4M3, F8E5M2 => F16 @ F32 => E4m3E5m2ToF16;
    F8E5M2, F8E4M3 => F32 @ F32 => E5m2E4m3ToF32;
    F8E5M2, F8E4M3 => F16 @ F32 => E5m2E4m3ToF16;
    F64, F64 => F64 @ F64 => F64;
    I8, I8 => I8 @ I32 => I8ToI8;
    I8, I8 => I32 @ I32 => I8ToI32;
    F16, F8E4M3 => F8E4M3 @ F32FastF16 => F16E4m3ToE4m3;
    F16, F8E4M3 => F16 @ F32FastF16 => F16E4m3ToF16;
    F16, F8E4M3 => F32 @ F32FastF16 => F16E4m3ToF32;
    F8E4M3, F16 => F8E4M3 @ F32FastF16 => E4m3F16ToE4m3;
    F8E4M3, F16 => F16 @ F32FastF16 => E4m3F16ToF16;
    F8E4M3, F16 => F32 @ F32FastF16 => E4m3F16ToF32;
};

static LOOKUP: Lazy<HashMap<TypeTuple, Kernel>> =
    Lazy::new(|| CATALOG.iter().copied().collect());

/// Resolve a format tuple to its kernel.
///
/// # Errors
///
/// [`GemmError::NotImplemented`] for any tuple outside [`CATALOG`].
pub fn lookup(key: &TypeTuple) -> Result<Kernel> {
    match LOOKUP.get(key) {
        Some(&kernel) => {
            log::debug!("matched {} to kernel {:?}", key, kernel);
            Ok(kernel)
        }
        None => {
            log::error!("No such template: {}", key);
            Err(GemmError::NotImplemented(*key))
        }
    }
}

/// Bind the concrete types of a [`Kernel`] and evaluate an expression with
/// them in scope.
///
/// ```rust
/// use mixgemm::dispatch::Kernel;
/// use mixgemm::types::{DataType, Element};
///
/// let a = mixgemm::with_kernel_types!(Kernel::E4m3F16ToF32, <A, B, O, S> => A::DATA_TYPE);
/// assert_eq!(a, DataType::F8E4M3);
/// ```
#[macro_export]
macro_rules! with_kernel_types {
    ($kernel:expr, <$a:ident, $b:ident, $o:ident, $s:ident> => $body:expr) => {{
        use $crate::dispatch::Kernel as __K;
        type __F16 = $crate::half::f16;
        type __Bf16 = $crate::half::bf16;
        type __E4m3 = $crate::float8::F8E4M3;
        type __E5m2 = $crate::float8::F8E5M2;
        match $kernel {
            __K::F32 => $crate::with_kernel_types!(@bind f32, f32, f32, f32; $a, $b, $o, $s => $body),
            __K::F64 => $crate::with_kernel_types!(@bind f64, f64, f64, f64; $a, $b, $o, $s => $body),
            __K::F16 => $crate::with_kernel_types!(@bind __F16, __F16, __F16, f32; $a, $b, $o, $s => $body),
            __K::F16ToF32 => $crate::with_kernel_types!(@bind __F16, __F16, f32, f32; $a, $b, $o, $s => $body),
            __K::Bf16 => $crate::with_kernel_types!(@bind __Bf16, __Bf16, __Bf16, f32; $a, $b, $o, $s => $body),
            __K::E4m3E4m3ToF32 => $crate::with_kernel_types!(@bind __E4m3, __E4m3, f32, f32; $a, $b, $o, $s => $body),
            __K::E4m3E4m3ToF16 => $crate::with_kernel_types!(@bind __E4m3, __E4m3, __F16, f32; $a, $b, $o, $s => $body),
            __K::E4m3E5m2ToF32 => $crate::with_kernel_types!(@bind __E4m3, __E5m2, f32, f32; $a, $b, $o, $s => $body),
            __K::E4m3E5m2ToF16 => $crate::with_kernel_types!(@bind __E4m3, __E5m2, __F16, f32; $a, $b, $o, $s => $body),
            __K::E5m2E4m3ToF32 => $crate::with_kernel_types!(@bind __E5m2, __E4m3, f32, f32; $a, $b, $o, $s => $body),
            __K::E5m2E4m3ToF16 => $crate::with_kernel_types!(@bind __E5m2, __E4m3, __F16, f32; $a, $b, $o, $s => $body),
            __K::I8ToI8 => $crate::with_kernel_types!(@bind i8, i8, i8, i32; $a, $b, $o, $s => $body),
            __K::I8ToI32 => $crate::with_kernel_types!(@bind i8, i8, i32, i32; $a, $b, $o, $s => $body),
            __K::F16E4m3ToE4m3 => $crate::with_kernel_types!(@bind __F16, __E4m3, __E4m3, f32; $a, $b, $o, $s => $body),
            __K::F16E4m3ToF16 => $crate::with_kernel_types!(@bind __F16, __E4m3, __F16, f32; $a, $b, $o, $s => $body),
            __K::F16E4m3ToF32 => $crate::with_kernel_types!(@bind __F16, __E4m3, f32, f32; $a, $b, $o, $s => $body),
            __K::E4m3F16ToE4m3 => $crate::with_kernel_types!(@bind __E4m3, __F16, __E4m3, f32; $a, $b, $o, $s => $body),
            __K::E4m3F16ToF16 => $crate::with_kernel_types!(@bind __E4m3, __F16, __F16, f32; $a, $b, $o, $s => $body),
            __K::E4m3F16ToF32 => $crate::with_kernel_types!(@bind __E4m3, __F16, f32, f32; $a, $b, $o, $s => $body),
        }
    }};
    (@bind $ta:ty, $tb:ty, $to:ty, $ts:ty; $a:ident, $b:ident, $o:ident, $s:ident => $body:expr) => {{
        #[allow(dead_code)]
        type $a = $ta;
        #[allow(dead_code)]
        type $b = $tb;
        #[allow(dead_code)]
        type $o = $to;
        #[allow(dead_code)]
        type $s = $ts;
        $body
    }};
}

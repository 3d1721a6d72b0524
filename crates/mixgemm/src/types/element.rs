use super::format::{DataType, ScalarKind};
use crate::dispatch::DevicePtr;
use float8::{F8E4M3, F8E5M2};
use half::{bf16, f16};
use std::fmt::Debug;
use std::ops::Mul;

/// A concrete element type bound to one [`DataType`] tag.
pub trait Element: Copy + Debug + Send + Sync + 'static {
    /// The runtime tag for this type.
    const DATA_TYPE: DataType;
}

macro_rules! impl_element {
    ($($ty:ty => $tag:ident),* $(,)?) => {
        $(
            impl Element for $ty {
                const DATA_TYPE: DataType = DataType::$tag;
            }
        )*
    };
}

impl_element! {
    f32 => F32,
    f64 => F64,
    f16 => F16,
    bf16 => Bf16,
    F8E4M3 => F8E4M3,
    F8E5M2 => F8E5M2,
    i8 => I8,
    i32 => I32,
}

/// Host scalar type used for alpha, beta and the scale factors.
pub trait ComputeScalar: Element + PartialEq + Mul<Output = Self> {
    const KIND: ScalarKind;
    const ONE: Self;

    /// Address of a process-lifetime `1` of this type.
    fn one_ptr() -> DevicePtr;

    fn is_one(self) -> bool {
        self == Self::ONE
    }
}

static ONE_F32: f32 = 1.0;
static ONE_F64: f64 = 1.0;
static ONE_I32: i32 = 1;

macro_rules! impl_compute_scalar {
    ($($ty:ty => $kind:ident, $one:expr, $stat:ident);* $(;)?) => {
        $(
            impl ComputeScalar for $ty {
                const KIND: ScalarKind = ScalarKind::$kind;
                const ONE: Self = $one;

                fn one_ptr() -> DevicePtr {
                    DevicePtr::from(&$stat as *const $ty)
                }
            }
        )*
    };
}

impl_compute_scalar! {
    f32 => F32, 1.0, ONE_F32;
    f64 => F64, 1.0, ONE_F64;
    i32 => I32, 1, ONE_I32;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_type_tags() {
        assert_eq!(<f16 as Element>::DATA_TYPE, DataType::F16);
        assert_eq!(<F8E5M2 as Element>::DATA_TYPE, DataType::F8E5M2);
        assert_eq!(<i8 as Element>::DATA_TYPE, DataType::I8);
    }

    #[test]
    fn test_tag_size_matches_type() {
        assert_eq!(DataType::F8E4M3.size_in_bytes(), std::mem::size_of::<F8E4M3>());
        assert_eq!(DataType::Bf16.size_in_bytes(), std::mem::size_of::<bf16>());
        assert_eq!(DataType::F64.alignment(), std::mem::align_of::<f64>());
    }

    #[test]
    fn test_one_ptr_points_at_one() {
        let p = <f64 as ComputeScalar>::one_ptr();
        assert!(!p.is_null());
        // Safety: one_ptr addresses a static f64.
        let v = unsafe { *p.as_ptr::<f64>() };
        assert_eq!(v, 1.0);
        assert!(<i32 as ComputeScalar>::ONE.is_one());
    }
}

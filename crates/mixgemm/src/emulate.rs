//! Numeric emulation helpers shared by the host-side GEMM paths.
//!
//! Narrow formats are computed on the host by widening them to `f32` (or
//! `f64` for the `f64` and `i8` paths), running the product in the wide type,
//! and narrowing the result back.
//!
//! | Direction | Floats | Integers |
//! |-----------|--------|----------|
//! | widen | exact | exact |
//! | narrow | round to nearest even | `as` cast (toward zero, saturating) |
//!
//! [`bf16_truncate`] implements the alternative bf16 policy: keep the top 16
//! bits of an `f32` and drop the rest, so NaN stays NaN and values round
//! toward zero.

use crate::types::Element;
use float8::{F8E4M3, F8E5M2};
use half::{bf16, f16};
use std::ops::Mul;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Conversion into a wide computation type.
pub trait Widen<W>: Element {
    fn widen(self) -> W;
}

/// Conversion from a wide computation type back to storage.
pub trait Narrow<W>: Element {
    fn narrow(value: W) -> Self;
}

macro_rules! impl_float_storage {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Widen<f32> for $ty {
                #[inline]
                fn widen(self) -> f32 {
                    self.to_f32()
                }
            }

            impl Widen<f64> for $ty {
                #[inline]
                fn widen(self) -> f64 {
                    self.to_f64()
                }
            }

            impl Narrow<f32> for $ty {
                #[inline]
                fn narrow(value: f32) -> Self {
                    <$ty>::from_f32(value)
                }
            }

            impl Narrow<f64> for $ty {
                #[inline]
                fn narrow(value: f64) -> Self {
                    <$ty>::from_f64(value)
                }
            }
        )*
    };
}

macro_rules! impl_primitive_storage {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Widen<f32> for $ty {
                #[inline]
                fn widen(self) -> f32 {
                    self as f32
                }
            }

            impl Widen<f64> for $ty {
                #[inline]
                fn widen(self) -> f64 {
                    self as f64
                }
            }

            impl Narrow<f32> for $ty {
                #[inline]
                fn narrow(value: f32) -> Self {
                    value as $ty
                }
            }

            impl Narrow<f64> for $ty {
                #[inline]
                fn narrow(value: f64) -> Self {
                    value as $ty
                }
            }
        )*
    };
}

impl_float_storage!(f16, bf16, F8E4M3, F8E5M2);
impl_primitive_storage!(f32, f64, i8, i32);

/// Drop the low 16 bits of `x`, returning the nearest bf16 toward zero.
///
/// A NaN whose payload lives only in the low half keeps a payload bit so
/// it does not turn into an infinity.
#[inline]
pub fn truncate_to_bf16(x: f32) -> bf16 {
    let bits = x.to_bits();
    let mut hi = (bits >> 16) as u16;
    if (bits & 0x7fff_0000) == 0x7f80_0000 && (bits & 0xffff) != 0 {
        hi |= 1;
    }
    bf16::from_bits(hi)
}

/// [`truncate_to_bf16`] followed by an exact widen back to `f32`.
#[inline]
pub fn bf16_truncate(x: f32) -> f32 {
    truncate_to_bf16(x).to_f32()
}

/// Convert a slice element-wise into a freshly allocated buffer.
pub fn map_slice<T, W, F>(src: &[T], f: F) -> Vec<W>
where
    T: Copy + Sync,
    W: Send,
    F: Fn(T) -> W + Sync + Send,
{
    #[cfg(feature = "parallel")]
    {
        src.par_iter().map(|&x| f(x)).collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        src.iter().map(|&x| f(x)).collect()
    }
}

/// Widen every element of `src`.
pub fn widen_slice<T, W>(src: &[T]) -> Vec<W>
where
    T: Widen<W>,
    W: Send,
{
    map_slice(src, Widen::widen)
}

/// Narrow `src` into `dst`, multiplying by `scale` first when one is given.
///
/// # Panics
/// Panics if the slices differ in length.
pub fn narrow_into<T, W>(src: &[W], dst: &mut [T], scale: Option<W>)
where
    T: Narrow<W>,
    W: Copy + Send + Sync + Mul<Output = W>,
{
    assert_eq!(src.len(), dst.len(), "narrow_into length mismatch");

    let convert = |w: W| match scale {
        Some(s) => T::narrow(w * s),
        None => T::narrow(w),
    };

    #[cfg(feature = "parallel")]
    {
        dst.par_iter_mut()
            .zip(src.par_iter())
            .for_each(|(d, &w)| *d = convert(w));
    }

    #[cfg(not(feature = "parallel"))]
    {
        for (d, &w) in dst.iter_mut().zip(src.iter()) {
            *d = convert(w);
        }
    }
}

//! Reference GEMM for every supported format combination.
//!
//! Each routine follows the same pipeline:
//!
//! ```text
//! A, B, C ──widen──▶ wide (f32, or f64 for f64/i8) ──[alpha_vec]──▶ dense GEMM ──[scale_d]──▶ narrow ──▶ C
//! ```
//!
//! With `alt` set and both inputs 16-bit floats, inputs (and a 16-bit C)
//! are widened through a truncating bf16 round trip instead.
//!
//! i8 products are accumulated in f64, so i32 overflow wraparound is not
//! reproduced.

use crate::blas::{extent, WideFloat};
use float8::{F8E4M3, F8E5M2};
use half::{bf16, f16};
use mixgemm::emulate::{map_slice, narrow_into, widen_slice, Narrow, Widen};
use mixgemm::types::{ComputeScalar, Operation};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Host scalar type of a reference routine and the wide type it computes in.
pub trait RefScalar: ComputeScalar {
    type Wide: WideFloat;
    const ZERO: Self;

    fn to_wide(self) -> Self::Wide;
}

impl RefScalar for f32 {
    type Wide = f32;
    const ZERO: Self = 0.0;

    #[inline]
    fn to_wide(self) -> f32 {
        self
    }
}

impl RefScalar for f64 {
    type Wide = f64;
    const ZERO: Self = 0.0;

    #[inline]
    fn to_wide(self) -> f64 {
        self
    }
}

impl RefScalar for i32 {
    type Wide = f64;
    const ZERO: Self = 0;

    #[inline]
    fn to_wide(self) -> f64 {
        self as f64
    }
}

/// Marker for the `(A, B, output, scalar)` combinations with a reference
/// routine.
pub trait ReferenceGemm {
    /// Routine name used in logs.
    const NAME: &'static str;
}

macro_rules! impl_reference_gemm {
    ($(($a:ty, $b:ty, $o:ty, $s:ty) => $name:literal),* $(,)?) => {
        $(
            impl ReferenceGemm for ($a, $b, $o, $s) {
                const NAME: &'static str = $name;
            }
        )*
    };
}

impl_reference_gemm! {
    (f32, f32, f32, f32) => "gemm_f32",
    (f64, f64, f64, f64) => "gemm_f64",
    (f16, f16, f16, f32) => "gemm_f16",
    (f16, f16, f32, f32) => "gemm_f16_f32",
    (bf16, bf16, bf16, f32) => "gemm_bf16",
    (bf16, bf16, f32, f32) => "gemm_bf16_f32",
    (F8E4M3, F8E4M3, f32, f32) => "gemm_e4m3_e4m3_f32",
    (F8E4M3, F8E4M3, f16, f32) => "gemm_e4m3_e4m3_f16",
    (F8E4M3, F8E5M2, f32, f32) => "gemm_e4m3_e5m2_f32",
    (F8E4M3, F8E5M2, f16, f32) => "gemm_e4m3_e5m2_f16",
    (F8E5M2, F8E4M3, f32, f32) => "gemm_e5m2_e4m3_f32",
    (F8E5M2, F8E4M3, f16, f32) => "gemm_e5m2_e4m3_f16",
    (i8, i8, i8, i32) => "gemm_i8_i8",
    (i8, i8, i32, i32) => "gemm_i8_i32",
    (f16, F8E4M3, F8E4M3, f32) => "gemm_f16_e4m3_e4m3",
    (f16, F8E4M3, f16, f32) => "gemm_f16_e4m3_f16",
    (f16, F8E4M3, f32, f32) => "gemm_f16_e4m3_f32",
    (F8E4M3, f16, F8E4M3, f32) => "gemm_e4m3_f16_e4m3",
    (F8E4M3, f16, f16, f32) => "gemm_e4m3_f16_f16",
    (F8E4M3, f16, f32, f32) => "gemm_e4m3_f16_f32",
}

/// Shape, layout and scalars of a reference call.
///
/// Defaults: no transposes, tight leading dimensions, `alpha = 1`,
/// `beta = 0`, `scale_d = 1`, `alt = false`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GemmParams<S> {
    pub trans_a: Operation,
    pub trans_b: Operation,
    pub alt: bool,
    pub m: usize,
    pub n: usize,
    pub k: usize,
    pub lda: usize,
    pub ldb: usize,
    pub ldc: usize,
    pub alpha: S,
    pub beta: S,
    pub scale_d: S,
}

impl<S: RefScalar> GemmParams<S> {
    pub fn new(m: usize, n: usize, k: usize) -> Self {
        Self {
            trans_a: Operation::N,
            trans_b: Operation::N,
            alt: false,
            m,
            n,
            k,
            lda: m,
            ldb: k,
            ldc: m,
            alpha: S::ONE,
            beta: S::ZERO,
            scale_d: S::ONE,
        }
    }

    /// Set the transposes; tight leading dimensions follow the new layout.
    pub fn trans(mut self, trans_a: Operation, trans_b: Operation) -> Self {
        self.trans_a = trans_a;
        self.trans_b = trans_b;
        self.lda = if trans_a.is_transposed() { self.k } else { self.m };
        self.ldb = if trans_b.is_transposed() { self.n } else { self.k };
        self
    }

    pub fn ld(mut self, lda: usize, ldb: usize, ldc: usize) -> Self {
        self.lda = lda;
        self.ldb = ldb;
        self.ldc = ldc;
        self
    }

    pub fn alpha_beta(mut self, alpha: S, beta: S) -> Self {
        self.alpha = alpha;
        self.beta = beta;
        self
    }

    pub fn scale_d(mut self, scale_d: S) -> Self {
        self.scale_d = scale_d;
        self
    }

    pub fn alt(mut self, alt: bool) -> Self {
        self.alt = alt;
        self
    }

    /// Elements of A the routine reads.
    pub fn a_extent(&self) -> usize {
        extent(self.trans_a, self.m, self.k, self.lda)
    }

    /// Elements of B the routine reads.
    pub fn b_extent(&self) -> usize {
        extent(self.trans_b, self.k, self.n, self.ldb)
    }

    /// Elements of C the routine reads and writes.
    pub fn c_extent(&self) -> usize {
        self.n * self.ldc
    }
}

/// Reference `C = scale_d * (alpha * op(A) * op(B) + beta * C)`.
///
/// # Panics
/// Panics if `a`, `b` or `c` is shorter than its extent.
///
/// # Example
///
/// ```
/// use mixgemm_ref::{gemm, GemmParams};
///
/// let a = [1.0f32, 3.0, 2.0, 4.0]; // [[1, 2], [3, 4]]
/// let b = [5.0f32, 7.0, 6.0, 8.0]; // [[5, 6], [7, 8]]
/// let mut c = [0.0f32; 4];
///
/// gemm::<f32, f32, f32, f32>(&GemmParams::new(2, 2, 2), &a, &b, &mut c);
/// assert_eq!(c, [19.0, 43.0, 22.0, 50.0]);
/// ```
pub fn gemm<TiA, TiB, To, Tc>(params: &GemmParams<Tc>, a: &[TiA], b: &[TiB], c: &mut [To])
where
    (TiA, TiB, To, Tc): ReferenceGemm,
    Tc: RefScalar,
    TiA: Widen<Tc::Wide>,
    TiB: Widen<Tc::Wide>,
    To: Widen<Tc::Wide> + Narrow<Tc::Wide>,
{
    reference_gemm(params, a, b, c, None)
}

/// [`gemm`] with a per-row alpha: row `i` of `op(A)` is scaled by
/// `alpha_vec[i]` before the product.
///
/// The scaling is applied to the flat, widened A buffer at index
/// `idx % m`, so it follows rows only when A is not transposed.
///
/// # Panics
/// Panics if `alpha_vec` holds fewer than `m` values, or as [`gemm`].
pub fn gemm_alphascale<TiA, TiB, To, Tc>(
    params: &GemmParams<Tc>,
    a: &[TiA],
    b: &[TiB],
    c: &mut [To],
    alpha_vec: &[Tc],
) where
    (TiA, TiB, To, Tc): ReferenceGemm,
    Tc: RefScalar,
    TiA: Widen<Tc::Wide>,
    TiB: Widen<Tc::Wide>,
    To: Widen<Tc::Wide> + Narrow<Tc::Wide>,
{
    assert!(
        alpha_vec.len() >= params.m,
        "alpha vector holds {} values, needs {}",
        alpha_vec.len(),
        params.m
    );
    reference_gemm(params, a, b, c, Some(alpha_vec))
}

fn widen_operand<T, W>(src: &[T], truncate: bool) -> Vec<W>
where
    T: Widen<W>,
    W: WideFloat,
{
    if truncate {
        map_slice(src, |x| x.widen().truncate_bf16())
    } else {
        widen_slice(src)
    }
}

fn scale_rows<S: RefScalar>(wa: &mut [S::Wide], alpha_vec: &[S], m: usize) {
    if m == 0 {
        return;
    }

    #[cfg(feature = "parallel")]
    {
        wa.par_iter_mut()
            .enumerate()
            .for_each(|(i, x)| *x = *x * alpha_vec[i % m].to_wide());
    }

    #[cfg(not(feature = "parallel"))]
    {
        for (i, x) in wa.iter_mut().enumerate() {
            *x = *x * alpha_vec[i % m].to_wide();
        }
    }
}

fn reference_gemm<TiA, TiB, To, Tc>(
    p: &GemmParams<Tc>,
    a: &[TiA],
    b: &[TiB],
    c: &mut [To],
    alpha_vec: Option<&[Tc]>,
) where
    (TiA, TiB, To, Tc): ReferenceGemm,
    Tc: RefScalar,
    TiA: Widen<Tc::Wide>,
    TiB: Widen<Tc::Wide>,
    To: Widen<Tc::Wide> + Narrow<Tc::Wide>,
{
    let (size_a, size_b, size_c) = (p.a_extent(), p.b_extent(), p.c_extent());
    assert!(a.len() >= size_a, "A holds {} elements, needs {}", a.len(), size_a);
    assert!(b.len() >= size_b, "B holds {} elements, needs {}", b.len(), size_b);
    assert!(c.len() >= size_c, "C holds {} elements, needs {}", c.len(), size_c);

    let truncate = p.alt
        && TiA::DATA_TYPE.is_half_width_float()
        && TiB::DATA_TYPE.is_half_width_float();
    let truncate_c = truncate && To::DATA_TYPE.is_half_width_float();

    log::debug!(
        "{}: m={} n={} k={} alt={} alpha_vec={}",
        <(TiA, TiB, To, Tc) as ReferenceGemm>::NAME,
        p.m,
        p.n,
        p.k,
        truncate,
        alpha_vec.is_some()
    );

    let mut wa = widen_operand::<TiA, Tc::Wide>(&a[..size_a], truncate);
    if let Some(v) = alpha_vec {
        scale_rows(&mut wa, v, p.m);
    }
    let wb = widen_operand::<TiB, Tc::Wide>(&b[..size_b], truncate);
    let mut wc = widen_operand::<To, Tc::Wide>(&c[..size_c], truncate_c);

    <Tc::Wide as WideFloat>::gemm(
        p.trans_a,
        p.trans_b,
        p.m,
        p.n,
        p.k,
        p.alpha.to_wide(),
        &wa,
        p.lda,
        &wb,
        p.ldb,
        p.beta.to_wide(),
        &mut wc,
        p.ldc,
    );

    let scale = if p.scale_d.is_one() {
        None
    } else {
        Some(p.scale_d.to_wide())
    };
    narrow_into(&wc, &mut c[..size_c], scale);
}

//! Column-major dense GEMM in the wide types, backed by `matrixmultiply`.

use mixgemm::emulate::bf16_truncate;
use mixgemm::types::Operation;
use std::ops::Mul;

/// A wide type the reference product is computed in.
pub trait WideFloat: Copy + Send + Sync + PartialEq + Mul<Output = Self> + 'static {
    /// Round-trip through a truncating bf16 conversion.
    fn truncate_bf16(self) -> Self;

    /// `C = alpha * op(A) * op(B) + beta * C` on column-major storage.
    ///
    /// # Panics
    /// Panics if a slice is too short for its dimensions and leading
    /// dimension.
    #[allow(clippy::too_many_arguments)]
    fn gemm(
        trans_a: Operation,
        trans_b: Operation,
        m: usize,
        n: usize,
        k: usize,
        alpha: Self,
        a: &[Self],
        lda: usize,
        b: &[Self],
        ldb: usize,
        beta: Self,
        c: &mut [Self],
        ldc: usize,
    );
}

/// Element count spanned by a column-major operand: `ld` per stored column.
#[inline]
pub fn extent(op: Operation, rows: usize, cols: usize, ld: usize) -> usize {
    if op.is_transposed() {
        rows * ld
    } else {
        cols * ld
    }
}

/// Row and column strides of `op(X)` for column-major `X` with leading
/// dimension `ld`.
#[inline]
fn strides(op: Operation, ld: usize) -> (isize, isize) {
    if op.is_transposed() {
        (ld as isize, 1)
    } else {
        (1, ld as isize)
    }
}

#[allow(clippy::too_many_arguments)]
fn check_operands<T>(
    trans_a: Operation,
    trans_b: Operation,
    m: usize,
    n: usize,
    k: usize,
    a: &[T],
    lda: usize,
    b: &[T],
    ldb: usize,
    c: &[T],
    ldc: usize,
) {
    let (a_rows, b_rows) = (
        if trans_a.is_transposed() { k } else { m },
        if trans_b.is_transposed() { n } else { k },
    );
    assert!(lda >= a_rows, "lda {} < {}", lda, a_rows);
    assert!(ldb >= b_rows, "ldb {} < {}", ldb, b_rows);
    assert!(ldc >= m, "ldc {} < {}", ldc, m);
    assert!(a.len() >= extent(trans_a, m, k, lda), "A dimensions mismatch");
    assert!(b.len() >= extent(trans_b, k, n, ldb), "B dimensions mismatch");
    assert!(c.len() >= n * ldc, "C dimensions mismatch");
}

macro_rules! impl_wide_float {
    ($($ty:ty => $gemm:path, $trunc:expr);* $(;)?) => {
        $(
            impl WideFloat for $ty {
                #[inline]
                fn truncate_bf16(self) -> Self {
                    $trunc(self)
                }

                fn gemm(
                    trans_a: Operation,
                    trans_b: Operation,
                    m: usize,
                    n: usize,
                    k: usize,
                    alpha: Self,
                    a: &[Self],
                    lda: usize,
                    b: &[Self],
                    ldb: usize,
                    beta: Self,
                    c: &mut [Self],
                    ldc: usize,
                ) {
                    if m == 0 || n == 0 {
                        return;
                    }
                    check_operands(trans_a, trans_b, m, n, k, a, lda, b, ldb, c, ldc);

                    let (rsa, csa) = strides(trans_a, lda);
                    let (rsb, csb) = strides(trans_b, ldb);

                    // Safety: check_operands bounds every index the strides reach.
                    unsafe {
                        $gemm(
                            m,
                            k,
                            n,
                            alpha,
                            a.as_ptr(),
                            rsa,
                            csa,
                            b.as_ptr(),
                            rsb,
                            csb,
                            beta,
                            c.as_mut_ptr(),
                            1,
                            ldc as isize,
                        );
                    }
                }
            }
        )*
    };
}

impl_wide_float! {
    f32 => matrixmultiply::sgemm, bf16_truncate;
    f64 => matrixmultiply::dgemm, |x: f64| bf16_truncate(x as f32) as f64;
}

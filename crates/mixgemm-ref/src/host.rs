//! A [`KernelBackend`] that executes problems on host memory.
//!
//! Every problem runs through the reference routines, so results from the
//! dispatch path can be compared against direct reference calls.

use crate::engine::{gemm, gemm_alphascale, GemmParams, RefScalar, ReferenceGemm};
use mixgemm::emulate::{Narrow, Widen};
use mixgemm::types::{Element, Epilogue};
use mixgemm::{
    Algorithm, ContractionProblem, DevicePtr, GemmData, GemmError, KernelBackend, Result, Status,
    Stream,
};
use std::slice;

/// Host executor for [`ContractionProblem`]s.
///
/// Supports the default epilogue, strided batches, `scale_a` and `scale_b`
/// (folded into alpha), `scale_d` and the per-row alpha vector. The bias and
/// gradient flag are checked against the epilogue before anything else.
#[derive(Debug, Clone, Copy)]
pub struct HostBackend {
    alt: bool,
}

impl HostBackend {
    /// Create a host backend.
    ///
    /// # Safety
    ///
    /// Every problem later handed to this backend must address host memory
    /// that is valid for its full extent: A, B, C and D for every batch,
    /// plus alpha, beta and any non-null scale pointers. D must not overlap
    /// A or B, and C must either be D or not overlap it.
    pub unsafe fn new() -> Self {
        Self { alt: false }
    }

    /// Use truncating bf16 conversion for 16-bit float inputs.
    pub fn alt(mut self, alt: bool) -> Self {
        self.alt = alt;
        self
    }

    fn execute(&self, problem: &ContractionProblem) -> Result<()> {
        check_supported(problem)?;
        log::debug!(
            "host {:?}: batch={} flops={}",
            problem.kernel,
            problem.batch_count,
            problem.flops()
        );
        let alt = self.alt;
        mixgemm::with_kernel_types!(problem.kernel, <TiA, TiB, To, Tc> => {
            // Safety: the caller of `HostBackend::new` vouched for the addresses.
            unsafe { execute_typed::<TiA, TiB, To, Tc>(problem, alt) }
        })
    }
}

fn not_implemented(what: &str) -> GemmError {
    GemmError::backend(Status::NotImplemented, format!("host backend: {what}"))
}

fn check_supported(p: &ContractionProblem) -> Result<()> {
    if p.epilogue.uses_bias() && p.bias.is_null() {
        return Err(GemmError::backend(
            Status::InvalidPointer,
            format!("epilogue {:?} reads a null bias", p.epilogue),
        ));
    }
    if p.gradient != p.epilogue.is_gradient() {
        return Err(GemmError::backend(
            Status::InvalidValue,
            format!("gradient={} does not match epilogue {:?}", p.gradient, p.epilogue),
        ));
    }
    if p.epilogue != Epilogue::Default {
        return Err(not_implemented("epilogues"));
    }
    if !p.scales.c.is_null() || !p.scales.e.is_null() {
        return Err(not_implemented("scale_c and scale_e"));
    }
    if p.uses_batch_pointers() {
        return Err(not_implemented("pointer-array batches"));
    }
    Ok(())
}

unsafe fn read_scalar<S: Copy>(ptr: DevicePtr, name: &str) -> Result<S> {
    if ptr.is_null() {
        return Err(GemmError::backend(
            Status::InvalidPointer,
            format!("{name} is null"),
        ));
    }
    Ok(ptr.as_ptr::<S>().read())
}

unsafe fn read_scale<S: RefScalar>(ptr: DevicePtr) -> S {
    if ptr.is_null() {
        S::ONE
    } else {
        ptr.as_ptr::<S>().read()
    }
}

unsafe fn execute_typed<TiA, TiB, To, Tc>(p: &ContractionProblem, alt: bool) -> Result<()>
where
    (TiA, TiB, To, Tc): ReferenceGemm,
    Tc: RefScalar,
    TiA: Widen<Tc::Wide>,
    TiB: Widen<Tc::Wide>,
    To: Widen<Tc::Wide> + Narrow<Tc::Wide>,
{
    let beta: Tc = read_scalar(p.beta, "beta")?;
    let alpha: Tc = read_scalar::<Tc>(p.alpha, "alpha")?
        * read_scale::<Tc>(p.scales.a)
        * read_scale::<Tc>(p.scales.b);
    let scale_d: Tc = read_scale(p.scales.d);

    if p.c.ptr.is_null() && beta != Tc::ZERO {
        return Err(GemmError::backend(
            Status::InvalidPointer,
            "C is null but beta is not zero",
        ));
    }
    if p.d.ptr.is_null() {
        return Err(GemmError::backend(Status::InvalidPointer, "D is null"));
    }

    let params = GemmParams::new(p.m, p.n, p.k)
        .trans(p.trans_a, p.trans_b)
        .ld(p.a.ld(), p.b.ld(), p.d.ld())
        .alpha_beta(alpha, beta)
        .scale_d(scale_d)
        .alt(alt);

    let alpha_vec = if p.scales.alpha_vec.is_null() {
        None
    } else {
        Some(slice::from_raw_parts(p.scales.alpha_vec.as_ptr::<Tc>(), p.m))
    };

    let (size_a, size_b, size_d) = (params.a_extent(), params.b_extent(), params.c_extent());
    let size_c = p.n * p.c.ld();

    for batch in 0..p.batch_count {
        let a = slice::from_raw_parts(
            p.a.ptr.as_ptr::<TiA>().add(batch * p.a.batch_stride),
            size_a,
        );
        let b = slice::from_raw_parts(
            p.b.ptr.as_ptr::<TiB>().add(batch * p.b.batch_stride),
            size_b,
        );
        let d_ptr = p.d.ptr.as_mut_ptr::<To>().add(batch * p.d.batch_stride);

        if !p.c.ptr.is_null() {
            let c_ptr = p.c.ptr.as_ptr::<To>().add(batch * p.c.batch_stride);
            if c_ptr != d_ptr as *const To {
                let c = slice::from_raw_parts(c_ptr, size_c);
                let d = slice::from_raw_parts_mut(d_ptr, size_d);
                copy_columns(c, p.c.ld(), d, p.d.ld(), p.m, p.n);
            }
        }

        let d = slice::from_raw_parts_mut(d_ptr, size_d);
        match alpha_vec {
            Some(v) => gemm_alphascale::<TiA, TiB, To, Tc>(&params, a, b, d, v),
            None => gemm::<TiA, TiB, To, Tc>(&params, a, b, d),
        }
    }
    Ok(())
}

fn copy_columns<T: Element>(src: &[T], lds: usize, dst: &mut [T], ldd: usize, m: usize, n: usize) {
    for j in 0..n {
        dst[j * ldd..j * ldd + m].copy_from_slice(&src[j * lds..j * lds + m]);
    }
}

impl KernelBackend for HostBackend {
    fn run(&self, _algo: &Algorithm, problem: &ContractionProblem, _stream: Stream) -> Result<()> {
        self.execute(problem)
    }

    fn create(&self, problem: ContractionProblem) -> Result<(GemmData, usize)> {
        self.create_grouped(vec![problem])
    }

    fn create_grouped(&self, problems: Vec<ContractionProblem>) -> Result<(GemmData, usize)> {
        for p in &problems {
            check_supported(p)?;
        }
        let count = problems.len();
        Ok((GemmData::new(problems), count))
    }

    fn launch(&self, _algo: &Algorithm, data: &GemmData, _stream: Stream) -> Result<()> {
        let problems = data
            .downcast_ref::<Vec<ContractionProblem>>()
            .ok_or_else(|| GemmError::backend(Status::InvalidValue, "foreign gemm data"))?;
        for p in problems {
            self.execute(p)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_columns_respects_ld() {
        let src = [1, 2, 9, 3, 4, 9];
        let mut dst = [0; 4];
        copy_columns(&src, 3, &mut dst, 2, 2, 2);
        assert_eq!(dst, [1, 2, 3, 4]);
    }
}

//! Reference GEMM emulation for verifying `mixgemm` kernels on the host.
//!
//! Narrow formats (f16, bf16, 8-bit floats, i8) are widened, multiplied in
//! `f32` or `f64` with [`matrixmultiply`], and narrowed back. The results
//! are the expected values for the kernels reached through `mixgemm`
//! dispatch.
//!
//! # Quick Start
//!
//! ```
//! use mixgemm_ref::{gemm, GemmParams};
//! use half::f16;
//!
//! let a: Vec<f16> = [1.0f32, 2.0, 3.0, 4.0].iter().map(|&x| f16::from_f32(x)).collect();
//! let b: Vec<f16> = [1.0f32, 0.0, 0.0, 1.0].iter().map(|&x| f16::from_f32(x)).collect();
//! let mut c = vec![0.0f32; 4];
//!
//! // f16 x f16 -> f32, scaled by 2 on the way out
//! let params = GemmParams::new(2, 2, 2).scale_d(2.0);
//! gemm::<f16, f16, f32, f32>(&params, &a, &b, &mut c);
//! assert_eq!(c, vec![2.0, 4.0, 6.0, 8.0]);
//! ```
//!
//! # Checking the dispatch path
//!
//! [`HostBackend`] implements [`mixgemm::KernelBackend`] on host memory, so a
//! request can go through `mixgemm::matmul` and be compared with a direct
//! reference call.
//!
//! # Supported combinations
//!
//! | A | B | Output | Scalars | Wide type |
//! |---|---|--------|---------|-----------|
//! | f32 | f32 | f32 | f32 | f32 |
//! | f64 | f64 | f64 | f64 | f64 |
//! | f16 | f16 | f16, f32 | f32 | f32 |
//! | bf16 | bf16 | bf16, f32 | f32 | f32 |
//! | e4m3 / e5m2 | e4m3 / e5m2 | f32, f16 | f32 | f32 |
//! | f16 / e4m3 | e4m3 / f16 | e4m3, f16, f32 | f32 | f32 |
//! | i8 | i8 | i8, i32 | i32 | f64 |

mod blas;
mod engine;
mod host;

pub use blas::WideFloat;
pub use engine::{gemm, gemm_alphascale, GemmParams, RefScalar, ReferenceGemm};
pub use host::HostBackend;

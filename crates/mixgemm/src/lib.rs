//! Host-side front end for mixed-precision GEMM.
//!
//! A request names its operand formats at runtime. `mixgemm` matches that
//! format tuple against a fixed catalog of specialized paths, checks the
//! operand addresses against the matched types, builds a
//! [`ContractionProblem`] and hands it to a [`KernelBackend`].
//!
//! ```text
//! MatmulArgs ──lookup──▶ Kernel ──TypedPtr::cast──▶ ContractionProblem ──▶ KernelBackend
//!  (tags)                 (types)     (alignment)        (format-erased)
//! ```
//!
//! # Quick Start
//!
//! ```ignore
//! use mixgemm::{matmul, Algorithm, Handle, MatmulArgs, MatrixRef, DevicePtr};
//! use mixgemm::types::{ComputeType, DataType, TypeTuple};
//!
//! let handle = Handle::new(my_backend);
//! let key = TypeTuple::uniform_output(DataType::Bf16, DataType::Bf16, DataType::Bf16, ComputeType::F32);
//! let args = MatmulArgs::new(key, m, n, k, a, b, c, d).scalars(alpha, beta);
//! matmul(&handle, &Algorithm::new(0, workspace_limit), &args)?;
//! ```
//!
//! # Pre-staged problems
//!
//! [`gemm_create`] and [`grouped_gemm_create`] hand problems to the backend
//! without running them; [`run_instance`] runs the returned
//! [`GemmInstance`] later.
//!
//! # Numeric emulation
//!
//! [`emulate`] holds the widening and narrowing conversions used by host
//! reference paths, including the truncating bf16 policy.
//!
//! # Features
//!
//! - `parallel` (default): element-wise conversions run on rayon.

pub mod api;
pub mod backend;
pub mod dispatch;
pub mod emulate;
pub mod error;
pub mod handle;
pub mod problem;
pub mod types;

pub use float8;
pub use half;

pub use api::{
    gemm_create, grouped_gemm_create, matmul, run_instance, GroupedMatmulArgs, MatmulArgs,
    MatrixRef,
};
pub use backend::{Algorithm, KernelBackend, Stream};
pub use dispatch::{DevicePtr, Kernel, TypedPtr};
pub use error::{GemmError, Operand, Result, Status};
pub use handle::{Handle, HandleConfig};
pub use problem::{ContractionProblem, GemmData, GemmInstance, GemmType, ScalePtrs, TensorDesc};

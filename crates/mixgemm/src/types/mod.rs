//! Numeric format tags and the concrete types behind them.
//!
//! Every multiplication request names its formats at runtime with a
//! [`DataType`] per operand and a [`ComputeType`] for accumulation. The
//! dispatch catalog resolves that tuple to concrete Rust types, each of
//! which implements [`Element`].
//!
//! # Formats
//!
//! | Tag | Rust type | Bytes | Notes |
//! |-----|-----------|-------|-------|
//! | [`DataType::F32`] | `f32` | 4 | |
//! | [`DataType::F64`] | `f64` | 8 | |
//! | [`DataType::F16`] | [`half::f16`] | 2 | IEEE binary16 |
//! | [`DataType::Bf16`] | [`half::bf16`] | 2 | truncated f32 exponent range |
//! | [`DataType::F8E4M3`] | [`float8::F8E4M3`] | 1 | max 448, no infinities |
//! | [`DataType::F8E5M2`] | [`float8::F8E5M2`] | 1 | f16-like exponent range |
//! | [`DataType::I8`] | `i8` | 1 | |
//! | [`DataType::I32`] | `i32` | 4 | |
//!
//! # Compute formats
//!
//! | Tag | Scalars (alpha, beta, scales) |
//! |-----|-------------------------------|
//! | [`ComputeType::F32`], [`ComputeType::F32FastXf32`], [`ComputeType::F32FastF16`] | `f32` |
//! | [`ComputeType::F64`] | `f64` |
//! | [`ComputeType::I32`] | `i32` |
//!
//! # Example
//!
//! ```rust
//! use mixgemm::types::{ComputeType, DataType, Element, ScalarKind, TypeTuple};
//!
//! let key = TypeTuple::uniform_output(DataType::F16, DataType::F16, DataType::F32, ComputeType::F32);
//! assert_eq!(key.compute.scalar_kind(), ScalarKind::F32);
//! assert_eq!(<half::f16 as Element>::DATA_TYPE, DataType::F16);
//! ```

mod element;
mod format;
mod op;

pub use element::{ComputeScalar, Element};
pub use format::{ComputeType, DataType, KernelDataType, ScalarKind, TypeTuple};
pub use op::{Epilogue, Operation};

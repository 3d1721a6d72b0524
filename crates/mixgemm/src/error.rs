//! Error types for GEMM dispatch.

use crate::types::TypeTuple;
use std::fmt;
use thiserror::Error;

/// Status codes reported at the library boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Success,
    InvalidHandle,
    NotImplemented,
    InvalidPointer,
    InvalidSize,
    MemoryError,
    InternalError,
    InvalidValue,
}

/// Matrix operand a pointer belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operand {
    A,
    B,
    C,
    D,
    E,
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operand::A => "A",
            Operand::B => "B",
            Operand::C => "C",
            Operand::D => "D",
            Operand::E => "E",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while dispatching a GEMM request.
#[derive(Debug, Error)]
pub enum GemmError {
    /// No catalog entry for the requested format tuple.
    #[error("No such template: {0}")]
    NotImplemented(TypeTuple),

    /// An operand pointer is not aligned for its element type.
    #[error("Operand {operand} at {address:#x} is not aligned to {alignment} bytes")]
    Misaligned {
        operand: Operand,
        address: usize,
        alignment: usize,
    },

    /// Per-problem vectors of a grouped request disagree in length.
    #[error("Grouped argument `{field}` has {got} entries, expected {expected}")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        got: usize,
    },

    /// An argument value is out of range.
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// The kernel backend rejected or failed the request.
    #[error("Backend error ({status:?}): {message}")]
    Backend { status: Status, message: String },
}

impl GemmError {
    /// Shorthand for a backend failure.
    pub fn backend(status: Status, message: impl Into<String>) -> Self {
        GemmError::Backend {
            status,
            message: message.into(),
        }
    }

    /// Status code reported for this error.
    pub fn status(&self) -> Status {
        match self {
            GemmError::NotImplemented(_) => Status::NotImplemented,
            GemmError::Misaligned { .. } | GemmError::LengthMismatch { .. } => Status::InvalidSize,
            GemmError::InvalidValue(_) => Status::InvalidValue,
            GemmError::Backend { status, .. } => *status,
        }
    }
}

/// Result type for GEMM dispatch.
pub type Result<T> = std::result::Result<T, GemmError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ComputeType, DataType};

    #[test]
    fn test_status_mapping() {
        let key = TypeTuple::uniform_output(
            DataType::I8,
            DataType::F16,
            DataType::F32,
            ComputeType::F32,
        );
        assert_eq!(GemmError::NotImplemented(key).status(), Status::NotImplemented);

        let err = GemmError::Misaligned {
            operand: Operand::B,
            address: 0x1002,
            alignment: 4,
        };
        assert_eq!(err.status(), Status::InvalidSize);
        assert_eq!(
            err.to_string(),
            "Operand B at 0x1002 is not aligned to 4 bytes"
        );

        let err = GemmError::backend(Status::MemoryError, "out of workspace");
        assert_eq!(err.status(), Status::MemoryError);
    }
}

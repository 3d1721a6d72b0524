//! The kernel backend seam.
//!
//! Kernel selection, compilation and launch live behind [`KernelBackend`].
//! The front end only hands it validated [`ContractionProblem`]s.

use crate::error::Result;
use crate::problem::{ContractionProblem, GemmData};

/// Opaque stream token owned by the execution handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Stream(pub usize);

/// A backend solution chosen by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Algorithm {
    /// Backend-defined solution index.
    pub index: i32,
    /// Upper bound on the workspace this solution may use.
    pub max_workspace_bytes: usize,
}

impl Algorithm {
    pub fn new(index: i32, max_workspace_bytes: usize) -> Self {
        Self {
            index,
            max_workspace_bytes,
        }
    }
}

/// Trait for kernel backends.
pub trait KernelBackend {
    /// Execute one problem immediately.
    fn run(&self, algo: &Algorithm, problem: &ContractionProblem, stream: Stream) -> Result<()>;

    /// Pre-stage a single problem. Returns backend state and the problem count.
    fn create(&self, problem: ContractionProblem) -> Result<(GemmData, usize)>;

    /// Pre-stage an ordered group of problems sharing one format tuple.
    fn create_grouped(&self, problems: Vec<ContractionProblem>) -> Result<(GemmData, usize)>;

    /// Execute state returned by [`create`](Self::create) or
    /// [`create_grouped`](Self::create_grouped).
    fn launch(&self, algo: &Algorithm, data: &GemmData, stream: Stream) -> Result<()>;
}

//! Execution handle and its configuration.

use crate::backend::{KernelBackend, Stream};
use crate::error::Result;
use once_cell::sync::OnceCell;

/// Environment variable read by [`HandleConfig::from_env`].
pub const SUPPRESS_BACKEND_ERRORS_ENV: &str = "MIXGEMM_SUPPRESS_BACKEND_ERRORS";

/// Per-handle settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HandleConfig {
    /// Do not log backend failures. They are still returned.
    pub suppress_backend_errors: bool,
}

/// Process-wide configuration read from the environment once.
static ENV_CONFIG: OnceCell<HandleConfig> = OnceCell::new();

impl HandleConfig {
    /// Configuration from the environment, read on first use and cached.
    pub fn from_env() -> Self {
        *ENV_CONFIG.get_or_init(|| {
            let suppress_backend_errors = std::env::var(SUPPRESS_BACKEND_ERRORS_ENV)
                .map(|v| parse_flag(&v))
                .unwrap_or(false);
            HandleConfig {
                suppress_backend_errors,
            }
        })
    }

    pub fn suppress_backend_errors(mut self, suppress: bool) -> Self {
        self.suppress_backend_errors = suppress;
        self
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Execution handle: a backend, the stream work is issued on, and settings.
pub struct Handle<B: KernelBackend> {
    backend: B,
    stream: Stream,
    config: HandleConfig,
}

impl<B: KernelBackend> Handle<B> {
    /// Create a handle configured from the environment.
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, HandleConfig::from_env())
    }

    pub fn with_config(backend: B, config: HandleConfig) -> Self {
        Self {
            backend,
            stream: Stream::default(),
            config,
        }
    }

    /// Issue subsequent work on `stream`.
    pub fn set_stream(&mut self, stream: Stream) {
        self.stream = stream;
    }

    pub fn stream(&self) -> Stream {
        self.stream
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn config(&self) -> &HandleConfig {
        &self.config
    }

    /// Call into the backend, logging a failure unless suppressed.
    pub(crate) fn submit<T>(&self, what: &str, call: impl FnOnce(&B) -> Result<T>) -> Result<T> {
        let result = call(&self.backend);
        if let Err(err) = &result {
            if !self.config.suppress_backend_errors {
                log::error!("{} failed: {}", what, err);
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("1"));
        assert!(parse_flag("TRUE"));
        assert!(parse_flag(" yes "));
        assert!(!parse_flag("0"));
        assert!(!parse_flag(""));
        assert!(!parse_flag("off"));
    }

    #[test]
    fn test_config_builder() {
        let cfg = HandleConfig::default().suppress_backend_errors(true);
        assert!(cfg.suppress_backend_errors);
    }
}

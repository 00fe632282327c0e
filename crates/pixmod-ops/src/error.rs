//! Error types for pixel operations.

use thiserror::Error;

/// Error type for pixel operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OpsError {
    /// Kernel has even or zero dimensions, or non-finite weights.
    #[error("invalid kernel: {0}")]
    InvalidKernel(String),

    /// Operation name is not one of the known filters.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Work was cancelled between row batches; no output was produced.
    #[error("operation cancelled")]
    Cancelled,

    /// Buffer construction or addressing error.
    #[error(transparent)]
    Core(#[from] pixmod_core::Error),
}

/// Result type for pixel operations.
pub type OpsResult<T> = Result<T, OpsError>;

//! Error types for PNG I/O.

use std::io;
use thiserror::Error;

/// Codec error.
#[derive(Debug, Error)]
pub enum IoError {
    /// File could not be opened, created or written.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Input is not a decodable PNG, or uses an unsupported layout.
    #[error("decode error: {0}")]
    DecodeError(String),

    /// The encoder rejected the buffer or failed while writing.
    #[error("encode error: {0}")]
    EncodeError(String),

    /// Decoded data did not form a valid pixel buffer.
    #[error(transparent)]
    Core(#[from] pixmod_core::Error),
}

/// Result type for codec operations.
pub type IoResult<T> = Result<T, IoError>;

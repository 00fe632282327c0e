//! Error types for pixmod-core operations.
//!
//! The [`Error`] enum covers the two ways a [`PixelBuffer`](crate::PixelBuffer)
//! can be misused:
//! - constructing a buffer with zero or inconsistent dimensions
//! - addressing a pixel outside the buffer
//!
//! # Usage
//!
//! ```rust
//! use pixmod_core::{Error, Result};
//!
//! fn check(x: u32, y: u32, width: u32, height: u32) -> Result<()> {
//!     if x >= width || y >= height {
//!         return Err(Error::out_of_bounds(x, y, width, height));
//!     }
//!     Ok(())
//! }
//! assert!(check(3, 0, 2, 2).is_err());
//! ```

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by pixel buffer construction and addressing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Pixel coordinates are outside the buffer.
    ///
    /// Returned when accessing (x, y) with `x >= width` or `y >= height`.
    #[error("pixel ({x}, {y}) out of bounds for image {width}x{height}")]
    OutOfBounds {
        /// X coordinate that was accessed
        x: u32,
        /// Y coordinate that was accessed
        y: u32,
        /// Buffer width
        width: u32,
        /// Buffer height
        height: u32,
    },

    /// Invalid buffer dimensions.
    ///
    /// Returned when width or height is zero, the size overflows, or the
    /// supplied storage does not hold exactly `width * height * 4` bytes.
    #[error("invalid dimensions: {width}x{height} ({reason})")]
    InvalidDimensions {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
        /// Reason why dimensions are invalid
        reason: String,
    },
}

impl Error {
    /// Creates an [`Error::OutOfBounds`] error.
    #[inline]
    pub fn out_of_bounds(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self::OutOfBounds {
            x,
            y,
            width,
            height,
        }
    }

    /// Creates an [`Error::InvalidDimensions`] error.
    #[inline]
    pub fn invalid_dimensions(width: u32, height: u32, reason: impl Into<String>) -> Self {
        Self::InvalidDimensions {
            width,
            height,
            reason: reason.into(),
        }
    }

    /// Returns `true` if this is a bounds-related error.
    #[inline]
    pub fn is_bounds_error(&self) -> bool {
        matches!(self, Self::OutOfBounds { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_bounds() {
        let err = Error::out_of_bounds(100, 50, 80, 60);
        let msg = err.to_string();
        assert!(msg.contains("100"));
        assert!(msg.contains("50"));
        assert!(msg.contains("80x60"));
        assert!(err.is_bounds_error());
    }

    #[test]
    fn test_invalid_dimensions() {
        let err = Error::invalid_dimensions(0, 10, "width must be > 0");
        let msg = err.to_string();
        assert!(msg.contains("0x10"));
        assert!(msg.contains("width must be > 0"));
        assert!(!err.is_bounds_error());
    }
}

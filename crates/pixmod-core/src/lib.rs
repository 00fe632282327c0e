//! # pixmod-core
//!
//! Core types for pixel-level image transformations.
//!
//! This crate provides the data model shared by every pixmod crate:
//!
//! - [`PixelBuffer`] - Owned RGBA8 raster, row-major, bounds-checked access
//! - [`Rgba`] - A single 8-bit RGBA pixel
//! - [`Hsv`] - Hue/saturation/value triple
//! - [`Error`] - Buffer construction and addressing errors
//!
//! ## Crate Structure
//!
//! ```text
//! pixmod-core (this crate)
//!    ^
//!    |
//!    +-- pixmod-ops (color conversion, convolution, filter pipeline)
//!    +-- pixmod-io  (PNG decode/encode)
//!    +-- pixmod-cli (command line front end)
//! ```
//!
//! The crate performs no I/O.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod buffer;
pub mod error;
pub mod pixel;

pub use buffer::{PixelBuffer, CHANNELS};
pub use error::{Error, Result};
pub use pixel::{Hsv, Rgba};

/// Prelude module for convenient imports.
///
/// ```
/// use pixmod_core::prelude::*;
///
/// let buf = PixelBuffer::filled(2, 2, Rgba::WHITE).unwrap();
/// assert_eq!(buf.dimensions(), (2, 2));
/// ```
pub mod prelude {
    pub use crate::buffer::{PixelBuffer, CHANNELS};
    pub use crate::error::{Error, Result};
    pub use crate::pixel::{Hsv, Rgba};
}

//! # pixmod-io
//!
//! PNG codec for [`PixelBuffer`](pixmod_core::PixelBuffer).
//!
//! Any 8- or 16-bit PNG decodes to RGBA8: palettes are expanded, 16-bit
//! samples are reduced to 8 bits, greyscale is replicated into R, G and B,
//! and images without alpha get an opaque alpha channel. Encoding always
//! writes RGBA8 at the highest compression level.
//!
//! # Example
//!
//! ```rust
//! use pixmod_core::{PixelBuffer, Rgba};
//!
//! let buf = PixelBuffer::filled(3, 2, Rgba::opaque(1, 2, 3)).unwrap();
//! let bytes = pixmod_io::encode(&buf).unwrap();
//! assert_eq!(pixmod_io::decode(&bytes).unwrap(), buf);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
pub mod png;

pub use error::{IoError, IoResult};
pub use crate::png::{decode, encode, read, write};

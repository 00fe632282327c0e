//! # pixmod-ops
//!
//! Pixel transformation engine.
//!
//! Every operation reads a [`PixelBuffer`](pixmod_core::PixelBuffer) and
//! returns a freshly allocated one; inputs are never modified.
//!
//! # Modules
//!
//! - [`color`] - Greyscale and RGB <-> HSV conversion
//! - [`kernel`] - Convolution kernels (identity, Gaussian, emboss)
//! - [`convolve`] - 2D and separable convolution with edge policies
//! - [`filter`] - Gaussian blur and emboss
//! - [`pipeline`] - Operation names and dispatch
//! - [`parallel`] - Row-batched execution and cancellation
//!
//! # Example
//!
//! ```rust
//! use pixmod_core::{PixelBuffer, Rgba};
//! use pixmod_ops::{FilterPipeline, Operation};
//!
//! let src = PixelBuffer::filled(3, 3, Rgba::opaque(255, 0, 0)).unwrap();
//! let grey = FilterPipeline::default().run(Operation::Grey, &src).unwrap();
//! assert_eq!(grey.get(1, 1).unwrap(), Rgba::opaque(76, 76, 76));
//! ```
//!
//! # Features
//!
//! - `parallel` (default) - spread row batches over the Rayon thread pool

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
pub mod color;
pub mod convolve;
pub mod filter;
pub mod kernel;
pub mod parallel;
pub mod pipeline;

pub use color::HsvMode;
pub use convolve::{AlphaMode, ConvolveOptions, EdgeMode};
pub use error::{OpsError, OpsResult};
pub use filter::EmbossMode;
pub use kernel::{Kernel, SeparableKernel};
pub use parallel::CancelToken;
pub use pipeline::{apply, FilterPipeline, Operation, PipelineConfig};

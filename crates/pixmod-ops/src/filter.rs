//! Ready-made filters built on the convolution engine.
//!
//! - [`gaussian_blur`] - separable Gaussian, radius `ceil(3 * sigma)`
//! - [`emboss`] - relief effect around mid-grey
//!
//! # Example
//!
//! ```rust
//! use pixmod_core::{PixelBuffer, Rgba};
//! use pixmod_ops::convolve::{ConvolveOptions, EdgeMode};
//! use pixmod_ops::filter::{emboss, gaussian_blur, EmbossMode};
//!
//! let flat = PixelBuffer::filled(8, 8, Rgba::opaque(40, 80, 120)).unwrap();
//! assert_eq!(gaussian_blur(&flat, 1.0, ConvolveOptions::default()).unwrap(), flat);
//!
//! let relief = emboss(&flat, EmbossMode::Greyscale, EdgeMode::Clamp);
//! assert_eq!(relief.get(3, 3).unwrap(), Rgba::opaque(128, 128, 128));
//! ```

use crate::color::{to_greyscale, to_greyscale_cancellable};
use crate::convolve::{
    convolve, convolve_cancellable, convolve_separable, convolve_separable_cancellable,
    ConvolveOptions, EdgeMode,
};
use crate::kernel::{Kernel, SeparableKernel};
use crate::parallel::CancelToken;
use crate::{OpsError, OpsResult};
use pixmod_core::PixelBuffer;
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Gaussian blur with standard deviation `sigma`.
///
/// # Errors
///
/// [`OpsError::InvalidKernel`] if `sigma` is not finite and positive.
pub fn gaussian_blur(
    src: &PixelBuffer,
    sigma: f32,
    opts: ConvolveOptions,
) -> OpsResult<PixelBuffer> {
    let kernel = SeparableKernel::gaussian(sigma)?;
    debug!(sigma, radius = kernel.radius(), edge = %opts.edge, "gaussian blur");
    Ok(convolve_separable(src, &kernel, opts))
}

/// [`gaussian_blur`] with cancellation.
pub fn gaussian_blur_cancellable(
    src: &PixelBuffer,
    sigma: f32,
    opts: ConvolveOptions,
    cancel: &CancelToken,
) -> OpsResult<PixelBuffer> {
    let kernel = SeparableKernel::gaussian(sigma)?;
    debug!(sigma, radius = kernel.radius(), edge = %opts.edge, "gaussian blur");
    convolve_separable_cancellable(src, &kernel, opts, cancel)
}

/// Which channels the emboss kernel sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmbossMode {
    /// Convert to greyscale first; output has R = G = B.
    #[default]
    Greyscale,
    /// Emboss R, G and B independently.
    PerChannel,
}

impl EmbossMode {
    /// Canonical name used on the command line.
    pub fn name(self) -> &'static str {
        match self {
            Self::Greyscale => "greyscale",
            Self::PerChannel => "per-channel",
        }
    }
}

impl fmt::Display for EmbossMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EmbossMode {
    type Err = OpsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "greyscale" | "grayscale" | "grey" | "gray" => Ok(Self::Greyscale),
            "per-channel" | "perchannel" | "color" | "colour" => Ok(Self::PerChannel),
            other => Err(OpsError::InvalidParameter(format!(
                "unknown emboss mode '{other}' (expected greyscale or per-channel)"
            ))),
        }
    }
}

/// Emboss with the fixed 3x3 relief kernel and bias 128.
///
/// Alpha is always preserved. Flat regions map to `(128, 128, 128)`.
pub fn emboss(src: &PixelBuffer, mode: EmbossMode, edge: EdgeMode) -> PixelBuffer {
    debug!(%mode, %edge, "emboss");
    let input = match mode {
        EmbossMode::Greyscale => Cow::Owned(to_greyscale(src)),
        EmbossMode::PerChannel => Cow::Borrowed(src),
    };
    convolve(&input, &Kernel::emboss(), ConvolveOptions::default().with_edge(edge))
}

/// [`emboss`] with cancellation.
pub fn emboss_cancellable(
    src: &PixelBuffer,
    mode: EmbossMode,
    edge: EdgeMode,
    cancel: &CancelToken,
) -> OpsResult<PixelBuffer> {
    debug!(%mode, %edge, "emboss");
    let input = match mode {
        EmbossMode::Greyscale => Cow::Owned(to_greyscale_cancellable(src, cancel)?),
        EmbossMode::PerChannel => Cow::Borrowed(src),
    };
    convolve_cancellable(
        &input,
        &Kernel::emboss(),
        ConvolveOptions::default().with_edge(edge),
        cancel,
    )
}

//! Operation dispatch.
//!
//! [`FilterPipeline`] maps an operation name (`grey`, `hsv`, `blur`,
//! `emboss`) to the matching transformation and runs it with the settings in
//! its [`PipelineConfig`]. Unknown names fail with
//! [`OpsError::UnsupportedOperation`] before any pixel is touched.
//!
//! # Example
//!
//! ```rust
//! use pixmod_core::{PixelBuffer, Rgba};
//! use pixmod_ops::pipeline::{FilterPipeline, Operation, PipelineConfig};
//!
//! let src = PixelBuffer::filled(4, 4, Rgba::opaque(200, 10, 10)).unwrap();
//!
//! let pipeline = FilterPipeline::new(PipelineConfig::default().with_sigma(2.0)).unwrap();
//! let blurred = pipeline.run(Operation::Blur, &src).unwrap();
//! assert_eq!(blurred, src);
//!
//! assert!(pipeline.apply("sharpen", &src).is_err());
//! ```

use crate::color::{convert_hsv_cancellable, to_greyscale_cancellable, HsvMode};
use crate::convolve::{AlphaMode, ConvolveOptions, EdgeMode};
use crate::filter::{emboss_cancellable, gaussian_blur_cancellable, EmbossMode};
use crate::kernel::{DEFAULT_SIGMA, MAX_KERNEL_RADIUS};
use crate::parallel::CancelToken;
use crate::{OpsError, OpsResult};
use pixmod_core::PixelBuffer;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, trace};

/// A named transformation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Luminance greyscale.
    Grey,
    /// HSV conversion, see [`HsvMode`].
    Hsv,
    /// Gaussian blur.
    Blur,
    /// Emboss relief.
    Emboss,
}

impl Operation {
    /// Every operation, in command-line order.
    pub const ALL: [Operation; 4] = [Self::Grey, Self::Hsv, Self::Blur, Self::Emboss];

    /// Name accepted by [`FromStr`].
    pub fn name(self) -> &'static str {
        match self {
            Self::Grey => "grey",
            Self::Hsv => "hsv",
            Self::Blur => "blur",
            Self::Emboss => "emboss",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = OpsError;

    /// Names are matched exactly.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.name() == s)
            .ok_or_else(|| OpsError::UnsupportedOperation(s.to_string()))
    }
}

/// Settings shared by all operations of a pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineConfig {
    /// Gaussian standard deviation for `blur`.
    pub sigma: f32,
    /// Edge policy for `blur` and `emboss`.
    pub edge: EdgeMode,
    /// Alpha handling for `blur`.
    pub blur_alpha: AlphaMode,
    /// Emboss channel handling.
    pub emboss_mode: EmbossMode,
    /// Output layout of `hsv`.
    pub hsv_mode: HsvMode,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sigma: DEFAULT_SIGMA,
            edge: EdgeMode::default(),
            blur_alpha: AlphaMode::default(),
            emboss_mode: EmbossMode::default(),
            hsv_mode: HsvMode::default(),
        }
    }
}

impl PipelineConfig {
    /// Sets the blur sigma.
    pub fn with_sigma(mut self, sigma: f32) -> Self {
        self.sigma = sigma;
        self
    }

    /// Sets the edge policy.
    pub fn with_edge(mut self, edge: EdgeMode) -> Self {
        self.edge = edge;
        self
    }

    /// Sets blur alpha handling.
    pub fn with_blur_alpha(mut self, alpha: AlphaMode) -> Self {
        self.blur_alpha = alpha;
        self
    }

    /// Sets the emboss mode.
    pub fn with_emboss_mode(mut self, mode: EmbossMode) -> Self {
        self.emboss_mode = mode;
        self
    }

    /// Sets the hsv mode.
    pub fn with_hsv_mode(mut self, mode: HsvMode) -> Self {
        self.hsv_mode = mode;
        self
    }

    /// Checks that the settings can build a kernel.
    ///
    /// # Errors
    ///
    /// [`OpsError::InvalidParameter`] if `sigma` is not finite and positive
    /// or needs a radius above [`MAX_KERNEL_RADIUS`].
    pub fn validate(&self) -> OpsResult<()> {
        if !self.sigma.is_finite() || self.sigma <= 0.0 {
            return Err(OpsError::InvalidParameter(format!(
                "sigma must be finite and > 0, got {}",
                self.sigma
            )));
        }
        if (3.0 * self.sigma).ceil() > MAX_KERNEL_RADIUS as f32 {
            return Err(OpsError::InvalidParameter(format!(
                "sigma {} needs a kernel radius above {MAX_KERNEL_RADIUS}",
                self.sigma
            )));
        }
        Ok(())
    }

    fn blur_options(&self) -> ConvolveOptions {
        ConvolveOptions::default()
            .with_edge(self.edge)
            .with_alpha(self.blur_alpha)
    }
}

/// Runs named operations on pixel buffers.
#[derive(Debug, Clone, Default)]
pub struct FilterPipeline {
    config: PipelineConfig,
    cancel: CancelToken,
}

impl FilterPipeline {
    /// Creates a pipeline after validating `config`.
    pub fn new(config: PipelineConfig) -> OpsResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            cancel: CancelToken::new(),
        })
    }

    /// Uses `token` for cancellation; cancel a clone of it to stop work.
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// The active configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// The token checked between row batches.
    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Parses `operation` and runs it on `src`.
    ///
    /// # Errors
    ///
    /// - [`OpsError::UnsupportedOperation`] for an unknown name
    /// - [`OpsError::Cancelled`] if the token fired
    pub fn apply(&self, operation: &str, src: &PixelBuffer) -> OpsResult<PixelBuffer> {
        let op = operation.parse::<Operation>()?;
        self.run(op, src)
    }

    /// Runs `op` on `src`, returning a new buffer of the same size.
    pub fn run(&self, op: Operation, src: &PixelBuffer) -> OpsResult<PixelBuffer> {
        trace!(%op, width = src.width(), height = src.height(), "run");
        let cfg = &self.config;
        let out = match op {
            Operation::Grey => to_greyscale_cancellable(src, &self.cancel)?,
            Operation::Hsv => convert_hsv_cancellable(src, cfg.hsv_mode, &self.cancel)?,
            Operation::Blur => {
                gaussian_blur_cancellable(src, cfg.sigma, cfg.blur_options(), &self.cancel)?
            }
            Operation::Emboss => {
                emboss_cancellable(src, cfg.emboss_mode, cfg.edge, &self.cancel)?
            }
        };
        debug!(%op, "operation complete");
        Ok(out)
    }
}

/// Runs `operation` with the default configuration.
///
/// ```rust
/// use pixmod_core::{PixelBuffer, Rgba};
/// use pixmod_ops::{apply, OpsError};
///
/// let white = PixelBuffer::filled(2, 2, Rgba::WHITE).unwrap();
/// assert_eq!(apply("grey", &white).unwrap(), white);
/// assert!(matches!(apply("bogus", &white), Err(OpsError::UnsupportedOperation(_))));
/// ```
pub fn apply(operation: &str, src: &PixelBuffer) -> OpsResult<PixelBuffer> {
    FilterPipeline::default().apply(operation, src)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pixmod_core::Rgba;

    fn sample() -> PixelBuffer {
        let mut buf = PixelBuffer::new(5, 4).unwrap();
        for y in 0..4 {
            for x in 0..5 {
                buf.set(x, y, Rgba::new((x * 50) as u8, (y * 60) as u8, 90, 255 - x as u8))
                    .unwrap();
            }
        }
        buf
    }

    #[test]
    fn test_operation_names() {
        for op in Operation::ALL {
            assert_eq!(op.name().parse::<Operation>().unwrap(), op);
            assert_eq!(op.to_string(), op.name());
        }
        assert_eq!(
            "GREY".parse::<Operation>(),
            Err(OpsError::UnsupportedOperation("GREY".into()))
        );
    }

    #[test]
    fn test_unsupported_operation_leaves_input() {
        let src = sample();
        let before = src.clone();
        let err = apply("bogus", &src).unwrap_err();
        assert_eq!(err, OpsError::UnsupportedOperation("bogus".into()));
        assert!(err.to_string().contains("bogus"));
        assert_eq!(src, before);
    }

    #[test]
    fn test_every_operation_keeps_shape() {
        let src = sample();
        for op in Operation::ALL {
            let out = apply(op.name(), &src).unwrap();
            assert!(out.same_dimensions(&src), "{op}");
            assert_ne!(out, src, "{op} should change the sample");
        }
    }

    #[test]
    fn test_grey_white_2x2() {
        let white = PixelBuffer::filled(2, 2, Rgba::WHITE).unwrap();
        assert_eq!(apply("grey", &white).unwrap(), white);
    }

    #[test]
    fn test_emboss_black_2x2() {
        let black = PixelBuffer::filled(2, 2, Rgba::BLACK).unwrap();
        let out = apply("emboss", &black).unwrap();
        assert!(out.pixels().all(|(_, _, p)| p == Rgba::new(128, 128, 128, 255)));
    }

    #[test]
    fn test_hsv_mode_dispatch() {
        let src = sample();
        let pipeline =
            FilterPipeline::new(PipelineConfig::default().with_hsv_mode(HsvMode::RoundTrip))
                .unwrap();
        assert_eq!(pipeline.run(Operation::Hsv, &src).unwrap(), src);
    }

    #[test]
    fn test_config_validation() {
        assert!(PipelineConfig::default().validate().is_ok());
        for sigma in [0.0, -2.0, f32::NAN, f32::INFINITY, 1e6] {
            let err = FilterPipeline::new(PipelineConfig::default().with_sigma(sigma)).unwrap_err();
            assert!(matches!(err, OpsError::InvalidParameter(_)), "{sigma}");
        }
    }

    #[test]
    fn test_cancelled_pipeline() {
        let token = CancelToken::new();
        let pipeline = FilterPipeline::default().with_cancel_token(token.clone());
        token.cancel();
        assert!(pipeline.cancel_token().is_cancelled());
        for op in Operation::ALL {
            assert_eq!(pipeline.run(op, &sample()), Err(OpsError::Cancelled));
        }
    }
}

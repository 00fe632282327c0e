//! Convolution kernels.
//!
//! A [`Kernel`] is an odd-sized matrix of `f32` weights with an anchor cell,
//! a divisor and a bias. The engine in [`convolve`](crate::convolve) computes
//! `clamp(round(sum / divisor + bias))` per channel; a divisor of zero skips
//! the division.
//!
//! # Built-in kernels
//!
//! - [`Kernel::identity`] - 1x1, returns the input
//! - [`Kernel::gaussian`] - radius `ceil(3 * sigma)`, divisor = sum of weights
//! - [`Kernel::emboss`] - 3x3 directional relief, bias 128
//!
//! [`SeparableKernel`] holds a 1D weight vector applied horizontally then
//! vertically, which is how Gaussian blur is actually run.
//!
//! # Example
//!
//! ```rust
//! use pixmod_ops::kernel::{Kernel, SeparableKernel};
//!
//! let k = Kernel::gaussian(1.0).unwrap();
//! assert_eq!((k.width(), k.height()), (7, 7));
//! assert_eq!(k.anchor(), (3, 3));
//!
//! let s = SeparableKernel::gaussian(1.0).unwrap();
//! assert_eq!(s.len(), 7);
//! ```

use crate::{OpsError, OpsResult};
use tracing::debug;

/// Default Gaussian standard deviation.
pub const DEFAULT_SIGMA: f32 = 1.0;

/// Largest accepted kernel radius; keeps `sigma` from requesting absurd sizes.
pub const MAX_KERNEL_RADIUS: usize = 1024;

/// Emboss weights, light from the top-left. Sums to zero so flat regions
/// land on the bias.
const EMBOSS_WEIGHTS: [f32; 9] = [
    -2.0, -1.0, 0.0,
    -1.0, 0.0, 1.0,
    0.0, 1.0, 2.0,
];

/// Bias added by the emboss kernel.
pub const EMBOSS_BIAS: f32 = 128.0;

/// 2D convolution kernel.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    weights: Vec<f32>,
    width: usize,
    height: usize,
    anchor: (usize, usize),
    divisor: f32,
    bias: f32,
}

impl Kernel {
    /// Creates a kernel from row-major weights.
    ///
    /// The anchor is the center cell, the divisor is 1 and the bias is 0.
    ///
    /// # Errors
    ///
    /// [`OpsError::InvalidKernel`] if a dimension is zero or even, the
    /// weight count is not `width * height`, or a weight is not finite.
    pub fn new(weights: Vec<f32>, width: usize, height: usize) -> OpsResult<Self> {
        if width == 0 || height == 0 || width % 2 == 0 || height % 2 == 0 {
            return Err(OpsError::InvalidKernel(format!(
                "kernel dimensions must be odd and positive, got {width}x{height}"
            )));
        }
        if weights.len() != width * height {
            return Err(OpsError::InvalidKernel(format!(
                "kernel data size {} doesn't match {}x{}",
                weights.len(),
                width,
                height
            )));
        }
        check_finite(&weights)?;
        Ok(Self {
            weights,
            width,
            height,
            anchor: (width / 2, height / 2),
            divisor: 1.0,
            bias: 0.0,
        })
    }

    /// 1x1 kernel with weight 1.
    pub fn identity() -> Self {
        Self {
            weights: vec![1.0],
            width: 1,
            height: 1,
            anchor: (0, 0),
            divisor: 1.0,
            bias: 0.0,
        }
    }

    /// Gaussian kernel of radius `ceil(3 * sigma)`.
    ///
    /// Weights are `exp(-(dx² + dy²) / 2σ²)`, left unnormalized; the divisor
    /// is their sum.
    ///
    /// # Errors
    ///
    /// [`OpsError::InvalidKernel`] if `sigma` is not finite and positive or
    /// the radius exceeds [`MAX_KERNEL_RADIUS`].
    pub fn gaussian(sigma: f32) -> OpsResult<Self> {
        SeparableKernel::gaussian(sigma).map(|s| s.to_kernel())
    }

    /// 3x3 emboss kernel `[-2 -1 0; -1 0 1; 0 1 2]`, divisor 1, bias 128.
    ///
    /// ```rust
    /// use pixmod_ops::kernel::Kernel;
    ///
    /// let k = Kernel::emboss();
    /// assert_eq!(k.sum(), 0.0);
    /// assert_eq!(k.bias(), 128.0);
    /// ```
    pub fn emboss() -> Self {
        Self {
            weights: EMBOSS_WEIGHTS.to_vec(),
            width: 3,
            height: 3,
            anchor: (1, 1),
            divisor: 1.0,
            bias: EMBOSS_BIAS,
        }
    }

    /// Sets the divisor. Zero disables division.
    pub fn with_divisor(mut self, divisor: f32) -> OpsResult<Self> {
        if !divisor.is_finite() {
            return Err(OpsError::InvalidKernel(format!("divisor must be finite, got {divisor}")));
        }
        self.divisor = divisor;
        Ok(self)
    }

    /// Sets the bias added after division.
    pub fn with_bias(mut self, bias: f32) -> OpsResult<Self> {
        if !bias.is_finite() {
            return Err(OpsError::InvalidKernel(format!("bias must be finite, got {bias}")));
        }
        self.bias = bias;
        Ok(self)
    }

    /// Moves the anchor cell.
    ///
    /// # Errors
    ///
    /// [`OpsError::InvalidKernel`] if the anchor is outside the kernel.
    pub fn with_anchor(mut self, x: usize, y: usize) -> OpsResult<Self> {
        if x >= self.width || y >= self.height {
            return Err(OpsError::InvalidKernel(format!(
                "anchor ({x}, {y}) outside {}x{} kernel",
                self.width, self.height
            )));
        }
        self.anchor = (x, y);
        Ok(self)
    }

    /// Sets the divisor to the sum of weights, if that sum is nonzero.
    pub fn normalized(mut self) -> Self {
        let sum = self.sum();
        if sum != 0.0 {
            self.divisor = sum;
        }
        self
    }

    /// Row-major weights.
    #[inline]
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// Weight at column `i`, row `j`.
    #[inline]
    pub fn weight(&self, i: usize, j: usize) -> f32 {
        self.weights[j * self.width + i]
    }

    /// Kernel width.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Kernel height.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Anchor cell as `(column, row)`.
    #[inline]
    pub fn anchor(&self) -> (usize, usize) {
        self.anchor
    }

    /// Divisor applied to the weighted sum; zero means none.
    #[inline]
    pub fn divisor(&self) -> f32 {
        self.divisor
    }

    /// Bias added after division.
    #[inline]
    pub fn bias(&self) -> f32 {
        self.bias
    }

    /// Half-size as `(x, y)`.
    #[inline]
    pub fn radius(&self) -> (usize, usize) {
        (self.width / 2, self.height / 2)
    }

    /// Sum of all weights.
    pub fn sum(&self) -> f32 {
        self.weights.iter().sum()
    }
}

/// 1D kernel applied along rows, then along columns.
///
/// The divisor applies to each pass and the bias once, at the end, so the
/// result equals the outer-product [`Kernel`] with divisor `divisor²`.
#[derive(Debug, Clone, PartialEq)]
pub struct SeparableKernel {
    weights: Vec<f32>,
    divisor: f32,
    bias: f32,
}

impl SeparableKernel {
    /// Creates a separable kernel with divisor 1 and bias 0.
    ///
    /// # Errors
    ///
    /// [`OpsError::InvalidKernel`] if the length is zero or even, or a
    /// weight is not finite.
    pub fn new(weights: Vec<f32>) -> OpsResult<Self> {
        if weights.is_empty() || weights.len() % 2 == 0 {
            return Err(OpsError::InvalidKernel(format!(
                "separable kernel length must be odd, got {}",
                weights.len()
            )));
        }
        check_finite(&weights)?;
        Ok(Self {
            weights,
            divisor: 1.0,
            bias: 0.0,
        })
    }

    /// Gaussian of radius `ceil(3 * sigma)`, divisor = sum of weights.
    pub fn gaussian(sigma: f32) -> OpsResult<Self> {
        let weights = gaussian_weights(sigma)?;
        let divisor = weights.iter().sum();
        debug!(sigma, size = weights.len(), "built gaussian kernel");
        Ok(Self {
            weights,
            divisor,
            bias: 0.0,
        })
    }

    /// Sets the per-pass divisor. Zero disables division.
    pub fn with_divisor(mut self, divisor: f32) -> OpsResult<Self> {
        if !divisor.is_finite() {
            return Err(OpsError::InvalidKernel(format!("divisor must be finite, got {divisor}")));
        }
        self.divisor = divisor;
        Ok(self)
    }

    /// Sets the bias added after the second pass.
    pub fn with_bias(mut self, bias: f32) -> OpsResult<Self> {
        if !bias.is_finite() {
            return Err(OpsError::InvalidKernel(format!("bias must be finite, got {bias}")));
        }
        self.bias = bias;
        Ok(self)
    }

    /// The 1D weights.
    #[inline]
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// Number of taps.
    #[inline]
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// Always `false`; construction rejects empty kernels.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Taps on each side of the center.
    #[inline]
    pub fn radius(&self) -> usize {
        self.weights.len() / 2
    }

    /// Per-pass divisor.
    #[inline]
    pub fn divisor(&self) -> f32 {
        self.divisor
    }

    /// Bias.
    #[inline]
    pub fn bias(&self) -> f32 {
        self.bias
    }

    /// Expands into the equivalent 2D kernel.
    pub fn to_kernel(&self) -> Kernel {
        let n = self.weights.len();
        let mut weights = Vec::with_capacity(n * n);
        for wy in &self.weights {
            for wx in &self.weights {
                weights.push(wx * wy);
            }
        }
        Kernel {
            weights,
            width: n,
            height: n,
            anchor: (n / 2, n / 2),
            divisor: self.divisor * self.divisor,
            bias: self.bias,
        }
    }
}

/// Unnormalized 1D Gaussian weights `exp(-d² / 2σ²)` for `d` in
/// `-r..=r`, `r = ceil(3σ)`.
///
/// # Errors
///
/// [`OpsError::InvalidKernel`] if `sigma` is not finite and positive, or the
/// radius exceeds [`MAX_KERNEL_RADIUS`].
pub fn gaussian_weights(sigma: f32) -> OpsResult<Vec<f32>> {
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(OpsError::InvalidKernel(format!(
            "gaussian sigma must be finite and > 0, got {sigma}"
        )));
    }
    let radius = (3.0 * sigma).ceil() as usize;
    if radius > MAX_KERNEL_RADIUS {
        return Err(OpsError::InvalidKernel(format!(
            "gaussian radius {radius} exceeds {MAX_KERNEL_RADIUS}"
        )));
    }
    let r = radius as i64;
    let two_sigma2 = 2.0 * sigma * sigma;
    Ok((-r..=r)
        .map(|d| (-((d * d) as f32) / two_sigma2).exp())
        .collect())
}

fn check_finite(weights: &[f32]) -> OpsResult<()> {
    match weights.iter().position(|w| !w.is_finite()) {
        Some(i) => Err(OpsError::InvalidKernel(format!("weight {i} is not finite"))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_new_rejects_even_and_zero() {
        assert!(matches!(Kernel::new(vec![1.0; 4], 2, 2), Err(OpsError::InvalidKernel(_))));
        assert!(matches!(Kernel::new(vec![], 0, 1), Err(OpsError::InvalidKernel(_))));
        assert!(matches!(Kernel::new(vec![1.0; 8], 3, 3), Err(OpsError::InvalidKernel(_))));
    }

    #[test]
    fn test_new_rejects_non_finite() {
        let mut w = vec![0.0; 9];
        w[4] = f32::NAN;
        assert!(Kernel::new(w, 3, 3).is_err());
        assert!(Kernel::identity().with_bias(f32::INFINITY).is_err());
    }

    #[test]
    fn test_non_square_kernel() {
        let k = Kernel::new(vec![1.0; 15], 5, 3).unwrap();
        assert_eq!(k.anchor(), (2, 1));
        assert_eq!(k.radius(), (2, 1));
    }

    #[test]
    fn test_anchor_bounds() {
        let k = Kernel::emboss();
        assert!(k.clone().with_anchor(2, 2).is_ok());
        assert!(k.with_anchor(3, 0).is_err());
    }

    #[test]
    fn test_gaussian_size_and_symmetry() {
        let k = Kernel::gaussian(1.0).unwrap();
        assert_eq!(k.width(), 7);
        let (w, h) = (k.width(), k.height());
        for j in 0..h {
            for i in 0..w {
                assert_relative_eq!(k.weight(i, j), k.weight(w - 1 - i, j));
                assert_relative_eq!(k.weight(i, j), k.weight(i, h - 1 - j));
            }
        }
        assert_relative_eq!(k.weight(3, 3), 1.0);
        assert_relative_eq!(k.divisor(), k.sum(), max_relative = 1e-5);

        assert_eq!(Kernel::gaussian(0.3).unwrap().width(), 3);
        assert_eq!(Kernel::gaussian(2.2).unwrap().width(), 15);
    }

    #[test]
    fn test_gaussian_rejects_bad_sigma() {
        for sigma in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            assert!(matches!(
                SeparableKernel::gaussian(sigma),
                Err(OpsError::InvalidKernel(_))
            ));
        }
        assert!(gaussian_weights(1000.0).is_err());
    }

    #[test]
    fn test_emboss_layout() {
        let k = Kernel::emboss();
        assert_eq!(k.weight(0, 0), -2.0);
        assert_eq!(k.weight(2, 2), 2.0);
        assert_eq!(k.weight(1, 1), 0.0);
        assert_eq!(k.divisor(), 1.0);
    }

    #[test]
    fn test_normalized() {
        let k = Kernel::new(vec![1.0; 9], 3, 3).unwrap().normalized();
        assert_eq!(k.divisor(), 9.0);
        // Zero-sum kernels keep their divisor
        assert_eq!(Kernel::emboss().normalized().divisor(), 1.0);
    }

    #[test]
    fn test_separable_expands_to_outer_product() {
        let s = SeparableKernel::new(vec![1.0, 2.0, 1.0])
            .unwrap()
            .with_divisor(4.0)
            .unwrap();
        let k = s.to_kernel();
        assert_eq!(k.weights(), &[1.0, 2.0, 1.0, 2.0, 4.0, 2.0, 1.0, 2.0, 1.0]);
        assert_eq!(k.divisor(), 16.0);
        assert!(SeparableKernel::new(vec![1.0, 1.0]).is_err());
    }
}

//! Pixel value types.
//!
//! - [`Rgba`] - one 8-bit RGBA pixel as stored in a [`PixelBuffer`](crate::PixelBuffer)
//! - [`Hsv`] - hue/saturation/value triple used by color conversion
//!
//! # Memory Layout
//!
//! [`Rgba`] is `#[repr(C)]` with channels in R, G, B, A order, matching the
//! interleaved byte order of the buffer.

use std::fmt;

/// An 8-bit RGBA pixel.
///
/// # Example
///
/// ```
/// use pixmod_core::Rgba;
///
/// let px = Rgba::new(255, 128, 0, 255);
/// assert_eq!(px.to_array(), [255, 128, 0, 255]);
/// assert_eq!(Rgba::from([255, 128, 0, 255]), px);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(C)]
pub struct Rgba {
    /// Red channel
    pub r: u8,
    /// Green channel
    pub g: u8,
    /// Blue channel
    pub b: u8,
    /// Alpha channel
    pub a: u8,
}

impl Rgba {
    /// Opaque black.
    pub const BLACK: Self = Self::new(0, 0, 0, 255);
    /// Opaque white.
    pub const WHITE: Self = Self::new(255, 255, 255, 255);
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);

    /// Creates a pixel from its four channels.
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Creates an opaque pixel.
    #[inline]
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Creates a grey pixel with R = G = B = `v`.
    #[inline]
    pub const fn grey(v: u8, a: u8) -> Self {
        Self::new(v, v, v, a)
    }

    /// Returns the channels as `[r, g, b, a]`.
    #[inline]
    pub const fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Returns the color channels as `[r, g, b]`.
    #[inline]
    pub const fn rgb(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    /// Returns a copy with the alpha channel replaced.
    #[inline]
    pub const fn with_alpha(self, a: u8) -> Self {
        Self::new(self.r, self.g, self.b, a)
    }

    /// Returns `true` if R, G and B are equal.
    #[inline]
    pub fn is_grey(self) -> bool {
        self.r == self.g && self.g == self.b
    }
}

impl From<[u8; 4]> for Rgba {
    #[inline]
    fn from(v: [u8; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

impl From<Rgba> for [u8; 4] {
    #[inline]
    fn from(px: Rgba) -> Self {
        px.to_array()
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

/// Hue/saturation/value triple.
///
/// Hue is in degrees, `[0, 360)`. Saturation and value are in `[0, 1]`.
/// Hue is `0` for achromatic colors.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Hsv {
    /// Hue in degrees `[0, 360)`
    pub h: f32,
    /// Saturation `[0, 1]`
    pub s: f32,
    /// Value `[0, 1]`
    pub v: f32,
}

impl Hsv {
    /// Creates a triple, wrapping hue into `[0, 360)` and clamping
    /// saturation and value into `[0, 1]`.
    ///
    /// ```
    /// use pixmod_core::Hsv;
    ///
    /// let c = Hsv::new(-90.0, 1.5, 0.5);
    /// assert_eq!(c.h, 270.0);
    /// assert_eq!(c.s, 1.0);
    /// ```
    pub fn new(h: f32, s: f32, v: f32) -> Self {
        let mut h = h.rem_euclid(360.0);
        // rem_euclid can land on 360.0 for tiny negative inputs
        if h >= 360.0 {
            h = 0.0;
        }
        Self {
            h,
            s: s.clamp(0.0, 1.0),
            v: v.clamp(0.0, 1.0),
        }
    }

    /// Returns `true` if the color carries no hue.
    #[inline]
    pub fn is_achromatic(self) -> bool {
        self.s == 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgba_array_conversions() {
        let px = Rgba::new(1, 2, 3, 4);
        let arr: [u8; 4] = px.into();
        assert_eq!(arr, [1, 2, 3, 4]);
        assert_eq!(Rgba::from(arr), px);
        assert_eq!(px.rgb(), [1, 2, 3]);
        assert_eq!(px.with_alpha(9).a, 9);
    }

    #[test]
    fn test_rgba_grey() {
        assert!(Rgba::grey(77, 10).is_grey());
        assert!(!Rgba::opaque(1, 2, 3).is_grey());
        assert_eq!(Rgba::default(), Rgba::TRANSPARENT);
    }

    #[test]
    fn test_hsv_normalizes() {
        let c = Hsv::new(720.0 + 30.0, -0.5, 2.0);
        approx::assert_relative_eq!(c.h, 30.0);
        assert_eq!(c.s, 0.0);
        assert_eq!(c.v, 1.0);
        assert!(c.is_achromatic());
        assert!(Hsv::new(-1e-9, 0.0, 0.0).h < 360.0);
    }
}

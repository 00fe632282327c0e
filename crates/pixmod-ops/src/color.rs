//! Color space conversion: greyscale and RGB <-> HSV.
//!
//! All conversions work on 8-bit RGBA buffers, allocate a new output buffer
//! and pass alpha through unchanged.
//!
//! # Greyscale
//!
//! Luminance uses the Rec.601 weights `0.299 R + 0.587 G + 0.114 B`, computed
//! in integer arithmetic and rounded half up. Because the weights sum to
//! exactly one, converting a grey pixel returns the same pixel and the
//! conversion is idempotent.
//!
//! # HSV
//!
//! Hue is in degrees `[0, 360)`, saturation and value in `[0, 1]`. Channels
//! are scaled to `[0, 1]` before conversion and rounded back to 8 bits after.
//! `hsv_to_rgb(rgb_to_hsv(rgb)) == rgb` holds for every 8-bit triple.
//!
//! # Example
//!
//! ```rust
//! use pixmod_core::{PixelBuffer, Rgba};
//! use pixmod_ops::color::{rgb_to_hsv, hsv_to_rgb, to_greyscale};
//!
//! let hsv = rgb_to_hsv(255, 0, 0);
//! assert_eq!((hsv.h, hsv.s, hsv.v), (0.0, 1.0, 1.0));
//! assert_eq!(hsv_to_rgb(hsv), [255, 0, 0]);
//!
//! let white = PixelBuffer::filled(2, 2, Rgba::WHITE).unwrap();
//! assert_eq!(to_greyscale(&white), white);
//! ```

use crate::parallel::{for_each_row, try_for_each_row, CancelToken};
use crate::{OpsError, OpsResult};
use pixmod_core::{Hsv, PixelBuffer, CHANNELS};
use std::fmt;
use std::str::FromStr;
use tracing::trace;

/// Rec.601 luma weights in thousandths.
const LUMA_R: u32 = 299;
const LUMA_G: u32 = 587;
const LUMA_B: u32 = 114;

/// Luminance of an 8-bit RGB triple, rounded to nearest (half up).
///
/// ```rust
/// use pixmod_ops::color::luminance;
///
/// assert_eq!(luminance(255, 255, 255), 255);
/// assert_eq!(luminance(255, 0, 0), 76);
/// assert_eq!(luminance(90, 90, 90), 90);
/// ```
#[inline]
pub fn luminance(r: u8, g: u8, b: u8) -> u8 {
    let sum = LUMA_R * r as u32 + LUMA_G * g as u32 + LUMA_B * b as u32;
    ((sum + 500) / 1000) as u8
}

// ============================================================================
// HSV math
// ============================================================================

/// Converts normalized RGB (`0.0..=1.0`) to HSV.
///
/// Uses the max/min hexagonal decomposition. Saturation is zero when value
/// is zero; hue is zero for achromatic input.
pub fn rgb_to_hsv_f32(r: f32, g: f32, b: f32) -> Hsv {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let d = max - min;

    let s = if max > 0.0 { d / max } else { 0.0 };
    let h = if d <= 0.0 {
        0.0
    } else if max == r {
        60.0 * ((g - b) / d)
    } else if max == g {
        60.0 * ((b - r) / d + 2.0)
    } else {
        60.0 * ((r - g) / d + 4.0)
    };

    Hsv::new(h, s, max)
}

/// Converts HSV to normalized RGB (`0.0..=1.0`).
pub fn hsv_to_rgb_f32(hsv: Hsv) -> [f32; 3] {
    let Hsv { h, s, v } = Hsv::new(hsv.h, hsv.s, hsv.v);
    if s <= 0.0 {
        return [v, v, v];
    }

    let c = v * s;
    let h_prime = h / 60.0;
    let x = c * (1.0 - ((h_prime % 2.0) - 1.0).abs());

    let (r1, g1, b1) = match h_prime.floor() as u8 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    let m = v - c;
    [r1 + m, g1 + m, b1 + m]
}

/// Converts an 8-bit RGB triple to HSV.
#[inline]
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> Hsv {
    rgb_to_hsv_f32(unit(r), unit(g), unit(b))
}

/// Converts HSV to an 8-bit RGB triple, rounding to nearest.
#[inline]
pub fn hsv_to_rgb(hsv: Hsv) -> [u8; 3] {
    let [r, g, b] = hsv_to_rgb_f32(hsv);
    [quantize(r), quantize(g), quantize(b)]
}

/// Packs HSV into three bytes: hue scaled by 255/360, saturation and value
/// by 255.
///
/// ```rust
/// use pixmod_core::Hsv;
/// use pixmod_ops::color::encode_hsv;
///
/// assert_eq!(encode_hsv(Hsv::new(180.0, 1.0, 0.5)), [128, 255, 128]);
/// ```
#[inline]
pub fn encode_hsv(hsv: Hsv) -> [u8; 3] {
    [quantize(hsv.h / 360.0), quantize(hsv.s), quantize(hsv.v)]
}

/// Inverse of [`encode_hsv`], up to 8-bit quantization.
#[inline]
pub fn decode_hsv(bytes: [u8; 3]) -> Hsv {
    Hsv::new(unit(bytes[0]) * 360.0, unit(bytes[1]), unit(bytes[2]))
}

#[inline]
fn unit(v: u8) -> f32 {
    v as f32 / 255.0
}

#[inline]
fn quantize(v: f32) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

// ============================================================================
// HSV mode
// ============================================================================

/// How the `hsv` operation stores its result in an RGBA buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HsvMode {
    /// Store H, S, V (scaled to 0-255) in the R, G, B channels.
    #[default]
    Encode,
    /// Convert RGB -> HSV -> RGB; visually near-identical to the input.
    RoundTrip,
}

impl HsvMode {
    /// Canonical name used on the command line.
    pub fn name(self) -> &'static str {
        match self {
            Self::Encode => "encode",
            Self::RoundTrip => "round-trip",
        }
    }
}

impl fmt::Display for HsvMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HsvMode {
    type Err = OpsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "encode" | "encoded" => Ok(Self::Encode),
            "round-trip" | "roundtrip" => Ok(Self::RoundTrip),
            other => Err(OpsError::InvalidParameter(format!(
                "unknown hsv mode '{other}' (expected encode or round-trip)"
            ))),
        }
    }
}

// ============================================================================
// Buffer conversions
// ============================================================================

fn grey_row(src: &[u8], dst: &mut [u8]) {
    for (s, d) in src.chunks_exact(CHANNELS).zip(dst.chunks_exact_mut(CHANNELS)) {
        let l = luminance(s[0], s[1], s[2]);
        d[0] = l;
        d[1] = l;
        d[2] = l;
        d[3] = s[3];
    }
}

fn hsv_row(src: &[u8], dst: &mut [u8], mode: HsvMode) {
    for (s, d) in src.chunks_exact(CHANNELS).zip(dst.chunks_exact_mut(CHANNELS)) {
        let hsv = rgb_to_hsv(s[0], s[1], s[2]);
        let rgb = match mode {
            HsvMode::Encode => encode_hsv(hsv),
            HsvMode::RoundTrip => hsv_to_rgb(hsv),
        };
        d[..3].copy_from_slice(&rgb);
        d[3] = s[3];
    }
}

/// Runs a row mapper over a fresh copy of `src`.
fn map_rows<F>(src: &PixelBuffer, f: F) -> PixelBuffer
where
    F: Fn(&[u8], &mut [u8]) + Send + Sync,
{
    let mut out = src.clone();
    let stride = src.stride();
    let data = src.as_raw();
    for_each_row(out.as_raw_mut(), stride, |y, row| {
        f(&data[y * stride..(y + 1) * stride], row)
    });
    out
}

fn try_map_rows<F>(src: &PixelBuffer, cancel: &CancelToken, f: F) -> OpsResult<PixelBuffer>
where
    F: Fn(&[u8], &mut [u8]) + Send + Sync,
{
    let mut out = src.clone();
    let stride = src.stride();
    let data = src.as_raw();
    try_for_each_row(out.as_raw_mut(), stride, cancel, |y, row| {
        f(&data[y * stride..(y + 1) * stride], row)
    })?;
    Ok(out)
}

/// Converts a buffer to greyscale; R = G = B = luminance, alpha kept.
pub fn to_greyscale(src: &PixelBuffer) -> PixelBuffer {
    trace!(width = src.width(), height = src.height(), "to_greyscale");
    map_rows(src, grey_row)
}

/// [`to_greyscale`] with cancellation between row batches.
pub fn to_greyscale_cancellable(src: &PixelBuffer, cancel: &CancelToken) -> OpsResult<PixelBuffer> {
    trace!(width = src.width(), height = src.height(), "to_greyscale");
    try_map_rows(src, cancel, grey_row)
}

/// Stores each pixel's HSV representation in its R, G, B channels.
///
/// See [`encode_hsv`] for the byte layout.
pub fn to_hsv_encoded(src: &PixelBuffer) -> PixelBuffer {
    convert_hsv(src, HsvMode::Encode)
}

/// Re-expresses each pixel through HSV and back to RGB.
pub fn hsv_round_trip(src: &PixelBuffer) -> PixelBuffer {
    convert_hsv(src, HsvMode::RoundTrip)
}

/// Applies the HSV conversion selected by `mode`.
pub fn convert_hsv(src: &PixelBuffer, mode: HsvMode) -> PixelBuffer {
    trace!(width = src.width(), height = src.height(), %mode, "convert_hsv");
    map_rows(src, |s, d| hsv_row(s, d, mode))
}

/// [`convert_hsv`] with cancellation between row batches.
pub fn convert_hsv_cancellable(
    src: &PixelBuffer,
    mode: HsvMode,
    cancel: &CancelToken,
) -> OpsResult<PixelBuffer> {
    trace!(width = src.width(), height = src.height(), %mode, "convert_hsv");
    try_map_rows(src, cancel, |s, d| hsv_row(s, d, mode))
}

//! Generic 2D convolution over [`PixelBuffer`]s.
//!
//! For every output pixel `(x, y)` the engine sums
//! `weight(i, j) * src(x + i - anchor_x, y + j - anchor_y)` per channel,
//! divides by the kernel divisor (when nonzero), adds the bias, rounds and
//! clamps to `0..=255`.
//!
//! Samples that fall outside the image are mapped back in by an [`EdgeMode`]:
//!
//! ```text
//! index:   -2 -1 | 0 1 2 3 | 4  5
//! Clamp:    0  0 | 0 1 2 3 | 3  3
//! Wrap:     2  3 | 0 1 2 3 | 0  1
//! Mirror:   2  1 | 0 1 2 3 | 2  1
//! ```
//!
//! Alpha is copied from the source by default ([`AlphaMode::Preserve`]).
//!
//! # Example
//!
//! ```rust
//! use pixmod_core::{PixelBuffer, Rgba};
//! use pixmod_ops::convolve::{convolve, ConvolveOptions};
//! use pixmod_ops::kernel::Kernel;
//!
//! let src = PixelBuffer::filled(4, 4, Rgba::opaque(10, 20, 30)).unwrap();
//! let out = convolve(&src, &Kernel::identity(), ConvolveOptions::default());
//! assert_eq!(out, src);
//! ```

use crate::kernel::{Kernel, SeparableKernel};
use crate::parallel::{for_each_row, try_for_each_row, CancelToken};
use crate::{OpsError, OpsResult};
use pixmod_core::{PixelBuffer, CHANNELS};
use std::fmt;
use std::str::FromStr;
use tracing::trace;

/// How samples outside the image are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EdgeMode {
    /// Repeat the nearest edge pixel.
    #[default]
    Clamp,
    /// Wrap around to the opposite edge.
    Wrap,
    /// Reflect about the edge pixel without repeating it.
    Mirror,
}

impl EdgeMode {
    /// Maps a possibly out-of-range index into `0..n`.
    ///
    /// `n` must be nonzero.
    ///
    /// ```rust
    /// use pixmod_ops::convolve::EdgeMode;
    ///
    /// assert_eq!(EdgeMode::Clamp.resolve(-3, 4), 0);
    /// assert_eq!(EdgeMode::Wrap.resolve(-1, 4), 3);
    /// assert_eq!(EdgeMode::Mirror.resolve(4, 4), 2);
    /// ```
    #[inline]
    pub fn resolve(self, i: i64, n: usize) -> usize {
        let n = n as i64;
        let r = match self {
            Self::Clamp => i.clamp(0, n - 1),
            Self::Wrap => i.rem_euclid(n),
            Self::Mirror => {
                if n == 1 {
                    0
                } else {
                    let period = 2 * (n - 1);
                    let m = i.rem_euclid(period);
                    if m >= n { period - m } else { m }
                }
            }
        };
        r as usize
    }

    /// Canonical name used on the command line.
    pub fn name(self) -> &'static str {
        match self {
            Self::Clamp => "clamp",
            Self::Wrap => "wrap",
            Self::Mirror => "mirror",
        }
    }
}

impl fmt::Display for EdgeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EdgeMode {
    type Err = OpsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "clamp" | "extend" => Ok(Self::Clamp),
            "wrap" | "periodic" => Ok(Self::Wrap),
            "mirror" | "reflect" => Ok(Self::Mirror),
            other => Err(OpsError::InvalidParameter(format!(
                "unknown edge mode '{other}' (expected clamp, wrap or mirror)"
            ))),
        }
    }
}

/// Whether the alpha channel takes part in convolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlphaMode {
    /// Copy alpha from the source pixel.
    #[default]
    Preserve,
    /// Convolve alpha like a color channel.
    Convolve,
}

impl AlphaMode {
    #[inline]
    fn channels(self) -> usize {
        match self {
            Self::Preserve => 3,
            Self::Convolve => CHANNELS,
        }
    }
}

/// Per-call convolution settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConvolveOptions {
    /// Out-of-range sample policy.
    pub edge: EdgeMode,
    /// Alpha handling.
    pub alpha: AlphaMode,
}

impl ConvolveOptions {
    /// Returns options with the given edge mode.
    pub fn with_edge(mut self, edge: EdgeMode) -> Self {
        self.edge = edge;
        self
    }

    /// Returns options with the given alpha mode.
    pub fn with_alpha(mut self, alpha: AlphaMode) -> Self {
        self.alpha = alpha;
        self
    }
}

/// Divides, biases, rounds and clamps an accumulated sum.
#[inline]
pub(crate) fn finish(sum: f32, divisor: f32, bias: f32) -> u8 {
    (divide(sum, divisor) + bias).round().clamp(0.0, 255.0) as u8
}

#[inline]
fn divide(sum: f32, divisor: f32) -> f32 {
    if divisor != 0.0 { sum / divisor } else { sum }
}

/// Source column for every `(x, tap)` pair, `taps` entries per column.
fn column_map(width: usize, taps: usize, anchor: usize, edge: EdgeMode) -> Vec<usize> {
    let mut map = Vec::with_capacity(width * taps);
    for x in 0..width {
        for i in 0..taps {
            map.push(edge.resolve(x as i64 + i as i64 - anchor as i64, width));
        }
    }
    map
}

// ============================================================================
// 2D
// ============================================================================

fn kernel_rows<'a>(
    src: &'a PixelBuffer,
    kernel: &'a Kernel,
    opts: ConvolveOptions,
    xmap: &'a [usize],
) -> impl Fn(usize, &mut [u8]) + Send + Sync + 'a {
    let data = src.as_raw();
    let stride = src.stride();
    let height = src.height() as usize;
    let (kw, kh) = (kernel.width(), kernel.height());
    let ay = kernel.anchor().1;
    let channels = opts.alpha.channels();

    move |y: usize, row: &mut [u8]| {
        let rows: Vec<&[u8]> = (0..kh)
            .map(|j| {
                let sy = opts.edge.resolve(y as i64 + j as i64 - ay as i64, height);
                &data[sy * stride..(sy + 1) * stride]
            })
            .collect();

        for (x, out) in row.chunks_exact_mut(CHANNELS).enumerate() {
            let taps = &xmap[x * kw..(x + 1) * kw];
            let mut sums = [0.0f32; CHANNELS];
            for (j, src_row) in rows.iter().enumerate() {
                for (i, &sx) in taps.iter().enumerate() {
                    let w = kernel.weight(i, j);
                    if w == 0.0 {
                        continue;
                    }
                    let px = &src_row[sx * CHANNELS..(sx + 1) * CHANNELS];
                    for c in 0..channels {
                        sums[c] += w * px[c] as f32;
                    }
                }
            }
            for c in 0..channels {
                out[c] = finish(sums[c], kernel.divisor(), kernel.bias());
            }
        }
    }
}

/// Convolves `src` with a 2D kernel into a new buffer.
pub fn convolve(src: &PixelBuffer, kernel: &Kernel, opts: ConvolveOptions) -> PixelBuffer {
    trace!(
        width = src.width(),
        height = src.height(),
        kernel_w = kernel.width(),
        kernel_h = kernel.height(),
        edge = %opts.edge,
        "convolve"
    );
    let xmap = column_map(src.width() as usize, kernel.width(), kernel.anchor().0, opts.edge);
    let mut out = src.clone();
    let stride = out.stride();
    for_each_row(out.as_raw_mut(), stride, kernel_rows(src, kernel, opts, &xmap));
    out
}

/// [`convolve`] with cancellation between row batches.
///
/// # Errors
///
/// [`OpsError::Cancelled`] if `cancel` fires before the last batch starts.
pub fn convolve_cancellable(
    src: &PixelBuffer,
    kernel: &Kernel,
    opts: ConvolveOptions,
    cancel: &CancelToken,
) -> OpsResult<PixelBuffer> {
    trace!(
        width = src.width(),
        height = src.height(),
        kernel_w = kernel.width(),
        kernel_h = kernel.height(),
        edge = %opts.edge,
        "convolve"
    );
    let xmap = column_map(src.width() as usize, kernel.width(), kernel.anchor().0, opts.edge);
    let mut out = src.clone();
    let stride = out.stride();
    try_for_each_row(out.as_raw_mut(), stride, cancel, kernel_rows(src, kernel, opts, &xmap))?;
    Ok(out)
}

// ============================================================================
// Separable
// ============================================================================

/// Horizontal pass: writes `sum / divisor` per channel into an f32 row.
fn horizontal_rows<'a>(
    src: &'a PixelBuffer,
    kernel: &'a SeparableKernel,
    opts: ConvolveOptions,
    xmap: &'a [usize],
) -> impl Fn(usize, &mut [f32]) + Send + Sync + 'a {
    let data = src.as_raw();
    let stride = src.stride();
    let taps = kernel.len();
    let channels = opts.alpha.channels();

    move |y: usize, row: &mut [f32]| {
        let src_row = &data[y * stride..(y + 1) * stride];
        for (x, out) in row.chunks_exact_mut(CHANNELS).enumerate() {
            let mut sums = [0.0f32; CHANNELS];
            for (&w, &sx) in kernel.weights().iter().zip(&xmap[x * taps..(x + 1) * taps]) {
                let px = &src_row[sx * CHANNELS..(sx + 1) * CHANNELS];
                for c in 0..channels {
                    sums[c] += w * px[c] as f32;
                }
            }
            for c in 0..channels {
                out[c] = divide(sums[c], kernel.divisor());
            }
        }
    }
}

/// Vertical pass over the intermediate rows, producing final bytes.
fn vertical_rows<'a>(
    tmp: &'a [f32],
    width: usize,
    height: usize,
    kernel: &'a SeparableKernel,
    opts: ConvolveOptions,
) -> impl Fn(usize, &mut [u8]) + Send + Sync + 'a {
    let row_len = width * CHANNELS;
    let radius = kernel.radius() as i64;
    let channels = opts.alpha.channels();

    move |y: usize, row: &mut [u8]| {
        let rows: Vec<&[f32]> = (0..kernel.len())
            .map(|j| {
                let sy = opts.edge.resolve(y as i64 + j as i64 - radius, height);
                &tmp[sy * row_len..(sy + 1) * row_len]
            })
            .collect();

        for (x, out) in row.chunks_exact_mut(CHANNELS).enumerate() {
            let mut sums = [0.0f32; CHANNELS];
            for (&w, tmp_row) in kernel.weights().iter().zip(&rows) {
                let px = &tmp_row[x * CHANNELS..(x + 1) * CHANNELS];
                for c in 0..channels {
                    sums[c] += w * px[c];
                }
            }
            for c in 0..channels {
                out[c] = finish(sums[c], kernel.divisor(), kernel.bias());
            }
        }
    }
}

/// Convolves with a separable kernel: one row pass, one column pass.
///
/// Matches [`convolve`] with [`SeparableKernel::to_kernel`] up to float
/// rounding, at `2n` instead of `n²` taps per pixel.
pub fn convolve_separable(
    src: &PixelBuffer,
    kernel: &SeparableKernel,
    opts: ConvolveOptions,
) -> PixelBuffer {
    trace!(
        width = src.width(),
        height = src.height(),
        taps = kernel.len(),
        edge = %opts.edge,
        "convolve_separable"
    );
    let (width, height) = (src.width() as usize, src.height() as usize);
    let xmap = column_map(width, kernel.len(), kernel.radius(), opts.edge);

    let mut tmp = vec![0.0f32; width * height * CHANNELS];
    for_each_row(&mut tmp, width * CHANNELS, horizontal_rows(src, kernel, opts, &xmap));

    let mut out = src.clone();
    let stride = out.stride();
    for_each_row(out.as_raw_mut(), stride, vertical_rows(&tmp, width, height, kernel, opts));
    out
}

/// [`convolve_separable`] with cancellation between row batches of both
/// passes.
pub fn convolve_separable_cancellable(
    src: &PixelBuffer,
    kernel: &SeparableKernel,
    opts: ConvolveOptions,
    cancel: &CancelToken,
) -> OpsResult<PixelBuffer> {
    trace!(
        width = src.width(),
        height = src.height(),
        taps = kernel.len(),
        edge = %opts.edge,
        "convolve_separable"
    );
    let (width, height) = (src.width() as usize, src.height() as usize);
    let xmap = column_map(width, kernel.len(), kernel.radius(), opts.edge);

    let mut tmp = vec![0.0f32; width * height * CHANNELS];
    try_for_each_row(
        &mut tmp,
        width * CHANNELS,
        cancel,
        horizontal_rows(src, kernel, opts, &xmap),
    )?;

    let mut out = src.clone();
    let stride = out.stride();
    try_for_each_row(
        out.as_raw_mut(),
        stride,
        cancel,
        vertical_rows(&tmp, width, height, kernel, opts),
    )?;
    Ok(out)
}

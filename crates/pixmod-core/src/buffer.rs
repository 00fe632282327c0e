//! Owned RGBA8 pixel buffer.
//!
//! # Memory Layout
//!
//! Pixels are stored **row-major**, top-to-bottom, four interleaved bytes per
//! pixel:
//!
//! ```text
//! Memory: [R G B A R G B A ...]  ← Row 0   (stride = width * 4)
//!         [R G B A R G B A ...]  ← Row 1
//!         ...
//! ```
//!
//! # Ownership
//!
//! A [`PixelBuffer`] owns its storage in a plain `Vec<u8>`. Cloning deep-copies
//! the pixels; two buffers never share storage. Transformations in
//! `pixmod-ops` borrow their input and return a new buffer.
//!
//! # Usage
//!
//! ```rust
//! use pixmod_core::{PixelBuffer, Rgba};
//!
//! let mut buf = PixelBuffer::new(4, 3).unwrap();
//! buf.set(1, 2, Rgba::opaque(255, 0, 0)).unwrap();
//! assert_eq!(buf.get(1, 2).unwrap(), Rgba::opaque(255, 0, 0));
//! assert!(buf.get(4, 0).is_err());
//! ```

use crate::{Error, Result, Rgba};

/// Number of interleaved channels per pixel.
pub const CHANNELS: usize = 4;

/// An owned RGBA8 raster with positive dimensions.
#[derive(Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl PixelBuffer {
    /// Creates a buffer filled with transparent black.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimensions`] if either dimension is zero or
    /// the byte size overflows `usize`.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        Self::filled(width, height, Rgba::TRANSPARENT)
    }

    /// Creates a buffer where every pixel is `pixel`.
    ///
    /// ```rust
    /// use pixmod_core::{PixelBuffer, Rgba};
    ///
    /// let white = PixelBuffer::filled(2, 2, Rgba::WHITE).unwrap();
    /// assert!(white.pixels().all(|(_, _, px)| px == Rgba::WHITE));
    /// ```
    pub fn filled(width: u32, height: u32, pixel: Rgba) -> Result<Self> {
        let len = byte_len(width, height)?;
        let mut data = Vec::with_capacity(len);
        let px = pixel.to_array();
        for _ in 0..len / CHANNELS {
            data.extend_from_slice(&px);
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Wraps existing RGBA8 bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimensions`] if either dimension is zero or
    /// `data.len() != width * height * 4`.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = byte_len(width, height)?;
        if data.len() != expected {
            return Err(Error::invalid_dimensions(
                width,
                height,
                format!("expected {} bytes, got {}", expected, data.len()),
            ));
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Returns the width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns `(width, height)`.
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Returns bytes per row (`width * 4`).
    #[inline]
    pub fn stride(&self) -> usize {
        self.width as usize * CHANNELS
    }

    /// Returns the total number of pixels.
    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Returns `true` if both buffers have the same width and height.
    #[inline]
    pub fn same_dimensions(&self, other: &Self) -> bool {
        self.dimensions() == other.dimensions()
    }

    /// Returns the raw RGBA bytes.
    #[inline]
    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    /// Returns the raw RGBA bytes for writing.
    ///
    /// The length is fixed, so the size invariant cannot be broken.
    #[inline]
    pub fn as_raw_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Consumes the buffer and returns the raw RGBA bytes.
    #[inline]
    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    #[inline]
    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * CHANNELS
    }

    #[inline]
    fn check(&self, x: u32, y: u32) -> Result<()> {
        if x >= self.width || y >= self.height {
            return Err(Error::out_of_bounds(x, y, self.width, self.height));
        }
        Ok(())
    }

    /// Returns the pixel at (x, y).
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfBounds`] if `x >= width` or `y >= height`.
    pub fn get(&self, x: u32, y: u32) -> Result<Rgba> {
        self.check(x, y)?;
        let o = self.offset(x, y);
        Ok(Rgba::new(
            self.data[o],
            self.data[o + 1],
            self.data[o + 2],
            self.data[o + 3],
        ))
    }

    /// Writes the pixel at (x, y).
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfBounds`] if `x >= width` or `y >= height`.
    pub fn set(&mut self, x: u32, y: u32, pixel: Rgba) -> Result<()> {
        self.check(x, y)?;
        let o = self.offset(x, y);
        self.data[o..o + CHANNELS].copy_from_slice(&pixel.to_array());
        Ok(())
    }

    /// Returns row `y` as a byte slice, or `None` past the last row.
    #[inline]
    pub fn row(&self, y: u32) -> Option<&[u8]> {
        if y >= self.height {
            return None;
        }
        let start = y as usize * self.stride();
        Some(&self.data[start..start + self.stride()])
    }

    /// Iterates over rows as byte slices.
    pub fn rows(&self) -> impl ExactSizeIterator<Item = &[u8]> + '_ {
        self.data.chunks_exact(self.stride())
    }

    /// Iterates over all pixels with their coordinates, row by row.
    pub fn pixels(&self) -> impl Iterator<Item = (u32, u32, Rgba)> + '_ {
        let width = self.width;
        self.data
            .chunks_exact(CHANNELS)
            .enumerate()
            .map(move |(i, px)| {
                let x = (i % width as usize) as u32;
                let y = (i / width as usize) as u32;
                (x, y, Rgba::new(px[0], px[1], px[2], px[3]))
            })
    }

    /// Calls `f` for every pixel in row-major order.
    ///
    /// ```rust
    /// use pixmod_core::{PixelBuffer, Rgba};
    ///
    /// let buf = PixelBuffer::filled(3, 2, Rgba::BLACK).unwrap();
    /// let mut count = 0;
    /// buf.for_each_pixel(|_, _, _| count += 1);
    /// assert_eq!(count, 6);
    /// ```
    pub fn for_each_pixel<F>(&self, mut f: F)
    where
        F: FnMut(u32, u32, Rgba),
    {
        for (x, y, px) in self.pixels() {
            f(x, y, px);
        }
    }

    /// Returns a new buffer with `f` applied to every pixel.
    ///
    /// ```rust
    /// use pixmod_core::{PixelBuffer, Rgba};
    ///
    /// let buf = PixelBuffer::filled(2, 2, Rgba::BLACK).unwrap();
    /// let inv = buf.map_pixels(|px| Rgba::new(255 - px.r, 255 - px.g, 255 - px.b, px.a));
    /// assert_eq!(inv.get(0, 0).unwrap(), Rgba::WHITE);
    /// ```
    pub fn map_pixels<F>(&self, f: F) -> Self
    where
        F: Fn(Rgba) -> Rgba,
    {
        let mut data = Vec::with_capacity(self.data.len());
        for px in self.data.chunks_exact(CHANNELS) {
            let out = f(Rgba::new(px[0], px[1], px[2], px[3]));
            data.extend_from_slice(&out.to_array());
        }
        Self {
            data,
            width: self.width,
            height: self.height,
        }
    }
}

impl std::fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// Validates dimensions and returns the storage size in bytes.
fn byte_len(width: u32, height: u32) -> Result<usize> {
    if width == 0 || height == 0 {
        return Err(Error::invalid_dimensions(
            width,
            height,
            "width and height must be > 0",
        ));
    }
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(CHANNELS))
        .ok_or_else(|| Error::invalid_dimensions(width, height, "image dimensions overflow"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_transparent() {
        let buf = PixelBuffer::new(3, 2).unwrap();
        assert_eq!(buf.dimensions(), (3, 2));
        assert_eq!(buf.stride(), 12);
        assert_eq!(buf.as_raw().len(), 24);
        assert!(buf.as_raw().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        assert!(matches!(
            PixelBuffer::new(0, 5),
            Err(Error::InvalidDimensions { .. })
        ));
        assert!(matches!(
            PixelBuffer::new(5, 0),
            Err(Error::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_from_raw_length_checked() {
        assert!(PixelBuffer::from_raw(2, 2, vec![0; 16]).is_ok());
        let err = PixelBuffer::from_raw(2, 2, vec![0; 15]).unwrap_err();
        assert!(err.to_string().contains("expected 16 bytes"));
    }

    #[test]
    fn test_get_set_bounds() {
        let mut buf = PixelBuffer::new(2, 3).unwrap();
        let red = Rgba::opaque(255, 0, 0);
        buf.set(1, 2, red).unwrap();
        assert_eq!(buf.get(1, 2).unwrap(), red);
        assert_eq!(buf.get(0, 0).unwrap(), Rgba::TRANSPARENT);

        assert_eq!(
            buf.get(2, 0).unwrap_err(),
            Error::out_of_bounds(2, 0, 2, 3)
        );
        assert!(buf.get(0, 3).unwrap_err().is_bounds_error());
        assert!(buf.set(5, 5, red).is_err());
    }

    #[test]
    fn test_row_major_layout() {
        let mut buf = PixelBuffer::new(2, 2).unwrap();
        buf.set(1, 0, Rgba::new(1, 2, 3, 4)).unwrap();
        buf.set(0, 1, Rgba::new(5, 6, 7, 8)).unwrap();
        assert_eq!(&buf.as_raw()[4..8], &[1, 2, 3, 4]);
        assert_eq!(&buf.as_raw()[8..12], &[5, 6, 7, 8]);
        assert_eq!(buf.row(1).unwrap()[..4], [5, 6, 7, 8]);
        assert!(buf.row(2).is_none());
        assert_eq!(buf.rows().len(), 2);
    }

    #[test]
    fn test_clone_is_deep() {
        let original = PixelBuffer::filled(2, 2, Rgba::BLACK).unwrap();
        let mut copy = original.clone();
        copy.set(0, 0, Rgba::WHITE).unwrap();
        assert_eq!(original.get(0, 0).unwrap(), Rgba::BLACK);
        assert_eq!(copy.get(0, 0).unwrap(), Rgba::WHITE);
        assert_ne!(original.as_raw().as_ptr(), copy.as_raw().as_ptr());
    }

    #[test]
    fn test_pixels_coordinates() {
        let mut buf = PixelBuffer::new(3, 2).unwrap();
        buf.set(2, 1, Rgba::WHITE).unwrap();
        let coords: Vec<(u32, u32)> = buf.pixels().map(|(x, y, _)| (x, y)).collect();
        assert_eq!(coords.len(), 6);
        assert_eq!(coords[0], (0, 0));
        assert_eq!(coords[3], (0, 1));
        let (x, y, px) = buf.pixels().last().unwrap();
        assert_eq!((x, y, px), (2, 1, Rgba::WHITE));
    }

    #[test]
    fn test_map_pixels_leaves_source() {
        let src = PixelBuffer::filled(2, 1, Rgba::new(10, 20, 30, 40)).unwrap();
        let out = src.map_pixels(|px| px.with_alpha(255));
        assert_eq!(src.get(0, 0).unwrap().a, 40);
        assert_eq!(out.get(1, 0).unwrap(), Rgba::new(10, 20, 30, 255));
        assert!(out.same_dimensions(&src));
    }
}

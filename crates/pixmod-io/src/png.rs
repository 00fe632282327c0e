//! PNG reading and writing.
//!
//! # Decoding
//!
//! The decoder normalizes every PNG to 8-bit samples (palettes and low bit
//! depths expanded, 16-bit stripped to the high byte, `tRNS` turned into
//! alpha) and then to RGBA:
//!
//! | PNG color type   | RGBA                |
//! |------------------|---------------------|
//! | `Rgba`           | as stored           |
//! | `Rgb`            | `r, g, b, 255`      |
//! | `Grayscale`      | `g, g, g, 255`      |
//! | `GrayscaleAlpha` | `g, g, g, a`        |
//!
//! # Encoding
//!
//! Buffers are written as 8-bit RGBA with [`png::Compression::High`].
//! [`write`] encodes fully in memory first, so an encoding failure never
//! leaves a truncated file behind.

use crate::{IoError, IoResult};
use pixmod_core::{PixelBuffer, CHANNELS};
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor, Seek, Write};
use std::path::Path;
use tracing::debug;

/// Reads a PNG file into an RGBA buffer.
///
/// # Errors
///
/// - [`IoError::Io`] if the file cannot be opened
/// - [`IoError::DecodeError`] if it is not a valid PNG
pub fn read<P: AsRef<Path>>(path: P) -> IoResult<PixelBuffer> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let buf = decode_from(BufReader::new(file))?;
    debug!(path = %path.display(), width = buf.width(), height = buf.height(), "decoded png");
    Ok(buf)
}

/// Decodes PNG bytes into an RGBA buffer.
pub fn decode(bytes: &[u8]) -> IoResult<PixelBuffer> {
    decode_from(Cursor::new(bytes))
}

/// Writes `buf` to `path` as an RGBA8 PNG.
///
/// # Errors
///
/// - [`IoError::EncodeError`] if encoding fails (no file is created)
/// - [`IoError::Io`] if the file cannot be written
pub fn write<P: AsRef<Path>>(path: P, buf: &PixelBuffer) -> IoResult<()> {
    let path = path.as_ref();
    let bytes = encode(buf)?;
    std::fs::write(path, &bytes)?;
    debug!(path = %path.display(), bytes = bytes.len(), "wrote png");
    Ok(())
}

/// Encodes `buf` as RGBA8 PNG bytes.
pub fn encode(buf: &PixelBuffer) -> IoResult<Vec<u8>> {
    let mut out = Vec::new();
    encode_into(&mut out, buf)?;
    Ok(out)
}

fn decode_from<R: BufRead + Seek>(input: R) -> IoResult<PixelBuffer> {
    let mut decoder = png::Decoder::new(input);
    decoder.set_transformations(png::Transformations::normalize_to_color8());

    let mut reader = decoder
        .read_info()
        .map_err(|e: png::DecodingError| IoError::DecodeError(e.to_string()))?;

    let buf_size = reader
        .output_buffer_size()
        .ok_or_else(|| IoError::DecodeError("cannot determine output buffer size".into()))?;
    let mut buf = vec![0u8; buf_size];
    let info = reader
        .next_frame(&mut buf)
        .map_err(|e: png::DecodingError| IoError::DecodeError(e.to_string()))?;
    buf.truncate(info.buffer_size());

    if info.bit_depth != png::BitDepth::Eight {
        return Err(IoError::DecodeError(format!(
            "unexpected bit depth {:?} after normalization",
            info.bit_depth
        )));
    }

    let rgba = match info.color_type {
        png::ColorType::Rgba => buf,
        png::ColorType::Rgb => expand(&buf, 3, |p| [p[0], p[1], p[2], 255]),
        png::ColorType::Grayscale => expand(&buf, 1, |p| [p[0], p[0], p[0], 255]),
        png::ColorType::GrayscaleAlpha => expand(&buf, 2, |p| [p[0], p[0], p[0], p[1]]),
        png::ColorType::Indexed => {
            return Err(IoError::DecodeError("palette was not expanded".into()));
        }
    };

    Ok(PixelBuffer::from_raw(info.width, info.height, rgba)?)
}

fn expand(src: &[u8], channels: usize, f: impl Fn(&[u8]) -> [u8; 4]) -> Vec<u8> {
    let mut out = Vec::with_capacity(src.len() / channels * CHANNELS);
    for px in src.chunks_exact(channels) {
        out.extend_from_slice(&f(px));
    }
    out
}

fn encode_into<W: Write>(out: W, buf: &PixelBuffer) -> IoResult<()> {
    let mut encoder = png::Encoder::new(out, buf.width(), buf.height());
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_compression(png::Compression::High);

    let mut writer = encoder
        .write_header()
        .map_err(|e| IoError::EncodeError(e.to_string()))?;
    writer
        .write_image_data(buf.as_raw())
        .map_err(|e| IoError::EncodeError(e.to_string()))?;
    writer
        .finish()
        .map_err(|e| IoError::EncodeError(e.to_string()))?;
    Ok(())
}

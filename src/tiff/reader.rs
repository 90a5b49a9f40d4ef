//! Raw pixel extraction from a sequential stream.
//!
//! The reader consumes one decoded [`RasterInfo`] plus the original stream
//! (positioned where the directory decoder left it, or at the start of the
//! file data region) and produces a [`PixelBuffer`] of the matching storage
//! kind. Dispatch is purely on the pixel format tag; nothing is re-parsed.
//!
//! Truncated data is handled leniently: a read that hits end-of-stream bumps
//! an EOF counter and the partial buffer is returned as-is. Callers that
//! require a complete image use [`PixelReader::read_complete`], which turns
//! an EOF-flagged result into [`FormatError::TruncatedImage`].

use std::io::{self, Read};

use tracing::debug;

use crate::error::FormatError;
use crate::pixels::buffer::PixelBuffer;

use super::decoder::{PixelFormat, RasterInfo};

// =============================================================================
// Buffer sizing
// =============================================================================

/// Chunk granularity for bulk reads.
const CHUNK_UNIT: usize = 8192;

/// Chunk size for a transfer of `byte_count` bytes: 1/25th of the total,
/// clamped to at least one unit and rounded down to a unit multiple.
fn buffer_size(byte_count: usize) -> usize {
    let size = byte_count / 25;
    if size < CHUNK_UNIT {
        CHUNK_UNIT
    } else {
        (size / CHUNK_UNIT) * CHUNK_UNIT
    }
}

// =============================================================================
// PixelReader
// =============================================================================

/// Reads the raw pixel data described by one [`RasterInfo`].
///
/// Holds only the EOF counter between calls; a reader can be reused for
/// multiple sub-images of the same file as long as the stream position is
/// advanced accordingly by the caller.
pub struct PixelReader<'a> {
    info: &'a RasterInfo,
    eof_errors: u32,
}

impl<'a> PixelReader<'a> {
    pub fn new(info: &'a RasterInfo) -> Self {
        Self {
            info,
            eof_errors: 0,
        }
    }

    /// Number of end-of-stream conditions hit so far.
    #[inline]
    pub fn eof_errors(&self) -> u32 {
        self.eof_errors
    }

    /// Read the pixel data, tolerating truncation.
    ///
    /// Skips the data offset from the current stream position first. On a
    /// premature end of stream the partial buffer is returned and
    /// [`Self::eof_errors`] is non-zero.
    pub fn read<R: Read>(&mut self, reader: &mut R) -> Result<PixelBuffer, FormatError> {
        let skip = self.info.data_offset();
        if skip > 0 {
            io::copy(&mut reader.by_ref().take(skip), &mut io::sink())?;
        }

        debug!(
            format = ?self.info.pixel_format,
            width = self.info.width,
            height = self.info.height,
            skip,
            "reading raw pixel data"
        );

        match self.info.pixel_format {
            PixelFormat::Gray8 | PixelFormat::Color8 => {
                let n = self.info.width as usize * self.info.height as usize;
                Ok(PixelBuffer::Bytes(self.read_byte_block(reader, n)?))
            }
            PixelFormat::Bitmap => Ok(PixelBuffer::Bytes(self.read_bitmap(reader)?)),
            PixelFormat::Gray16Unsigned | PixelFormat::Gray16Signed => {
                Ok(PixelBuffer::Shorts(self.read_16bit(reader)?))
            }
            PixelFormat::Gray32Int | PixelFormat::Gray32Unsigned | PixelFormat::Gray32Float => {
                Ok(PixelBuffer::Floats(self.read_32bit(reader)?))
            }
            PixelFormat::Rgb | PixelFormat::Bgr | PixelFormat::Argb => {
                Ok(PixelBuffer::Argb(self.read_chunky_rgb(reader)?))
            }
            PixelFormat::RgbPlanar => Ok(PixelBuffer::Argb(self.read_planar_rgb(reader)?)),
        }
    }

    /// Read the pixel data, rejecting truncation.
    pub fn read_complete<R: Read>(&mut self, reader: &mut R) -> Result<PixelBuffer, FormatError> {
        let buffer = self.read(reader)?;
        if self.eof_errors > 0 {
            return Err(FormatError::TruncatedImage {
                eof_errors: self.eof_errors,
            });
        }
        Ok(buffer)
    }

    fn eof_error(&mut self) {
        self.eof_errors += 1;
    }

    // -------------------------------------------------------------------------
    // 8-bit
    // -------------------------------------------------------------------------

    /// Bulk-read `byte_count` bytes in chunks, stopping early at end of
    /// stream. Partial reads are normal and simply continue the loop.
    fn read_byte_block<R: Read>(
        &mut self,
        reader: &mut R,
        byte_count: usize,
    ) -> Result<Vec<u8>, FormatError> {
        let chunk = buffer_size(byte_count);
        let mut pixels = vec![0u8; byte_count];
        let mut total_read = 0usize;
        while total_read < byte_count {
            let want = chunk.min(byte_count - total_read);
            let actual = reader.read(&mut pixels[total_read..total_read + want])?;
            if actual == 0 {
                self.eof_error();
                break;
            }
            total_read += actual;
        }
        Ok(pixels)
    }

    /// Read a 1-bit packed image and expand it to one 0/255 byte per pixel.
    ///
    /// Rows are padded to a whole byte when the width is not a multiple of 8;
    /// the bulk read is bounded by the packed size so a well-formed bitmap
    /// never trips the EOF counter.
    fn read_bitmap<R: Read>(&mut self, reader: &mut R) -> Result<Vec<u8>, FormatError> {
        let width = self.info.width as usize;
        let height = self.info.height as usize;
        let scan = width.div_ceil(8);
        let packed = self.read_byte_block(reader, scan * height)?;

        let mut pixels = vec![0u8; width * height];
        let mut index = 0usize;
        for y in 0..height {
            let row = y * width;
            for x in 0..scan {
                let byte = packed[index];
                index += 1;
                for bit in 0..8 {
                    let col = x * 8 + bit;
                    if col < width && (byte >> (7 - bit)) & 1 == 1 {
                        pixels[row + col] = 255;
                    }
                }
            }
        }
        Ok(pixels)
    }

    // -------------------------------------------------------------------------
    // 16-bit
    // -------------------------------------------------------------------------

    /// Fill as much of `buf` as possible; on end of stream the remainder is
    /// zeroed so the caller can still convert the whole window.
    fn fill_or_zero<R: Read>(&mut self, reader: &mut R, buf: &mut [u8]) -> Result<bool, FormatError> {
        let mut filled = 0usize;
        while filled < buf.len() {
            let actual = reader.read(&mut buf[filled..])?;
            if actual == 0 {
                buf[filled..].fill(0);
                self.eof_error();
                return Ok(false);
            }
            filled += actual;
        }
        Ok(true)
    }

    fn read_16bit<R: Read>(&mut self, reader: &mut R) -> Result<Vec<u16>, FormatError> {
        let n_pixels = self.info.width as usize * self.info.height as usize;
        let byte_count = n_pixels * 2;
        let signed = self.info.pixel_format == PixelFormat::Gray16Signed;

        let mut pixels = vec![0u16; n_pixels];
        let mut buffer = vec![0u8; buffer_size(byte_count)];
        let mut total_read = 0usize;
        let mut base = 0usize;

        while total_read < byte_count {
            let window = buffer.len().min(byte_count - total_read);
            let complete = self.fill_or_zero(reader, &mut buffer[..window])?;

            for (i, pair) in buffer[..window].chunks_exact(2).enumerate() {
                let raw = if self.info.intel_byte_order {
                    u16::from_le_bytes([pair[0], pair[1]])
                } else {
                    u16::from_be_bytes([pair[0], pair[1]])
                };
                // Signed data is stored biased into the unsigned range
                pixels[base + i] = if signed { raw.wrapping_add(32768) } else { raw };
            }

            if !complete {
                // Signed data biases the untouched tail too, not just the
                // zeroed remainder of this window
                if signed {
                    pixels[base + window / 2..].fill(32768);
                }
                break;
            }
            total_read += window;
            base += window / 2;
        }
        Ok(pixels)
    }

    // -------------------------------------------------------------------------
    // 32-bit
    // -------------------------------------------------------------------------

    fn read_32bit<R: Read>(&mut self, reader: &mut R) -> Result<Vec<f32>, FormatError> {
        let n_pixels = self.info.width as usize * self.info.height as usize;
        let byte_count = n_pixels * 4;
        let format = self.info.pixel_format;

        let mut pixels = vec![0f32; n_pixels];
        let mut buffer = vec![0u8; buffer_size(byte_count)];
        let mut total_read = 0usize;
        let mut base = 0usize;

        while total_read < byte_count {
            let window = buffer.len().min(byte_count - total_read);
            let complete = self.fill_or_zero(reader, &mut buffer[..window])?;

            for (i, quad) in buffer[..window].chunks_exact(4).enumerate() {
                let raw = if self.info.intel_byte_order {
                    u32::from_le_bytes([quad[0], quad[1], quad[2], quad[3]])
                } else {
                    u32::from_be_bytes([quad[0], quad[1], quad[2], quad[3]])
                };
                pixels[base + i] = match format {
                    PixelFormat::Gray32Float => f32::from_bits(raw),
                    // Widen without sign extension
                    PixelFormat::Gray32Unsigned => raw as f32,
                    _ => raw as i32 as f32,
                };
            }

            if !complete {
                break;
            }
            total_read += window;
            base += window / 4;
        }
        Ok(pixels)
    }

    // -------------------------------------------------------------------------
    // Chunky and planar color
    // -------------------------------------------------------------------------

    fn read_chunky_rgb<R: Read>(&mut self, reader: &mut R) -> Result<Vec<u32>, FormatError> {
        let width = self.info.width as usize;
        let height = self.info.height as usize;
        let format = self.info.pixel_format;
        let bytes_per_pixel = if format == PixelFormat::Argb { 4 } else { 3 };
        let byte_count = width * height * bytes_per_pixel;

        let mut pixels = vec![0u32; width * height];
        // 24 * width is a multiple of both 3 and 4, so groups never split
        let mut buffer = vec![0u8; 24 * width.max(1)];
        let mut total_read = 0usize;
        let mut base = 0usize;

        while total_read < byte_count {
            let window = buffer.len().min(byte_count - total_read);
            let complete = self.fill_or_zero(reader, &mut buffer[..window])?;

            for (i, group) in buffer[..window].chunks_exact(bytes_per_pixel).enumerate() {
                let (r, g, b) = match format {
                    PixelFormat::Bgr => (group[2], group[1], group[0]),
                    // First byte is alpha padding, discarded
                    PixelFormat::Argb => (group[1], group[2], group[3]),
                    _ => (group[0], group[1], group[2]),
                };
                pixels[base + i] =
                    0xFF00_0000 | (r as u32) << 16 | (g as u32) << 8 | b as u32;
            }

            if !complete {
                break;
            }
            total_read += window;
            base += window / bytes_per_pixel;
        }
        Ok(pixels)
    }

    /// Three sequential full-size planes, red then green then blue.
    fn read_planar_rgb<R: Read>(&mut self, reader: &mut R) -> Result<Vec<u32>, FormatError> {
        let plane_size = self.info.width as usize * self.info.height as usize;
        let reds = self.read_byte_block(reader, plane_size)?;
        let greens = self.read_byte_block(reader, plane_size)?;
        let blues = self.read_byte_block(reader, plane_size)?;

        let mut pixels = vec![0u32; plane_size];
        for i in 0..plane_size {
            pixels[i] = 0xFF00_0000
                | (reds[i] as u32) << 16
                | (greens[i] as u32) << 8
                | blues[i] as u32;
        }
        Ok(pixels)
    }
}

// =============================================================================
// Tests
// =============================================================================

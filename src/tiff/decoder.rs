//! TIFF image file directory (IFD) decoding.
//!
//! The decoder walks the IFD chain of an uncompressed TIFF stream and
//! produces one [`RasterInfo`] per directory: pixel format, geometry, strip
//! offset, byte order, optional color lookup table and spatial/density
//! calibration. It never touches pixel data; that is `tiff::reader`'s job.
//!
//! # Header Structure
//!
//! ```text
//! Bytes 0-1: Byte order (0x4949 = little-endian "II", 0x4D4D = big-endian "MM")
//! Bytes 2-5: Offset to first IFD (4 bytes)
//! ```
//!
//! Each IFD is a 2-byte entry count followed by 12-byte entries
//! (tag, field type, count, value-or-offset) and a 4-byte next-IFD offset.
//! Entries are dispatched in file order; several tags are cross-dependent
//! (SampleFormat reclassifies a format already set by BitsPerSample, ColorMap
//! only applies to an established 8-bit gray image), so file order is load
//! bearing and tags must not be reordered before dispatch.

use std::io::{Read, Seek, SeekFrom};

use tracing::{debug, warn};

use crate::error::FormatError;

use super::tags::{
    FieldType, TiffTag, COMPRESSION_NONE, COMPRESSION_TOLERATED, SAMPLE_FORMAT_FLOATING_POINT,
    SAMPLE_FORMAT_SIGNED,
};

// =============================================================================
// Constants
// =============================================================================

/// Magic bytes indicating little-endian byte order ("II" for Intel)
const BYTE_ORDER_LITTLE_ENDIAN: u16 = 0x4949;

/// Magic bytes indicating big-endian byte order ("MM" for Motorola)
const BYTE_ORDER_BIG_ENDIAN: u16 = 0x4D4D;

/// Application marker an ImageDescription must start with to be kept.
const DESCRIPTION_MARKER: &str = "ImageJ";

/// Declared byte size of the extended calibration header.
const EXTENDED_HEADER_SIZE: u32 = 256;

// =============================================================================
// PixelFormat
// =============================================================================

/// Storage format of the pixel data described by one IFD.
///
/// Set by BitsPerSample and then refined by SamplesPerPixel, SampleFormat,
/// ColorMap and PlanarConfiguration as entries are dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// 8-bit unsigned grayscale
    Gray8,
    /// 8-bit indexed color through a 256-entry lookup table
    Color8,
    /// 16-bit unsigned grayscale
    Gray16Unsigned,
    /// 16-bit signed grayscale, stored biased by +32768
    Gray16Signed,
    /// 32-bit signed integer grayscale
    Gray32Int,
    /// 32-bit unsigned integer grayscale
    Gray32Unsigned,
    /// 32-bit IEEE float grayscale
    Gray32Float,
    /// 24-bit interleaved red/green/blue
    Rgb,
    /// Three sequential full-size planes, red then green then blue
    RgbPlanar,
    /// 24-bit interleaved blue/green/red
    Bgr,
    /// 32-bit interleaved alpha/red/green/blue
    Argb,
    /// 1-bit packed black and white, MSB first
    Bitmap,
}

impl PixelFormat {
    /// Nominal storage bits per pixel.
    pub const fn bits_per_pixel(self) -> u32 {
        match self {
            PixelFormat::Bitmap => 1,
            PixelFormat::Gray8 | PixelFormat::Color8 => 8,
            PixelFormat::Gray16Unsigned | PixelFormat::Gray16Signed => 16,
            PixelFormat::Gray32Int
            | PixelFormat::Gray32Unsigned
            | PixelFormat::Gray32Float
            | PixelFormat::Argb => 32,
            PixelFormat::Rgb | PixelFormat::RgbPlanar | PixelFormat::Bgr => 24,
        }
    }
}

// =============================================================================
// Calibration
// =============================================================================

/// Density calibration function declared by the extended header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationFunction {
    StraightLine,
    Poly2,
    Poly3,
    Poly4,
    Exponential,
    Power,
    Log,
    Rodbard,
    UncalibratedOd,
}

/// 256-entry RGB lookup table decoded from a ColorMap tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorLut {
    pub reds: Vec<u8>,
    pub greens: Vec<u8>,
    pub blues: Vec<u8>,
}

// =============================================================================
// RasterInfo
// =============================================================================

/// Everything one IFD says about its raster.
///
/// This is the contract between the directory decoder and the pixel reader:
/// the reader dispatches purely on `pixel_format` and the offset/byte-order
/// fields, while the calibration fields ride along for downstream consumers.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterInfo {
    /// Storage format of the pixel data
    pub pixel_format: PixelFormat,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Byte offset of the pixel data from the start of the file
    pub offset: u32,
    /// 64-bit pixel data offset; preferred over `offset` when non-zero
    pub long_offset: u64,
    /// Whether multi-byte pixel samples are little-endian
    pub intel_byte_order: bool,
    /// Whether sample value zero renders as white
    pub white_is_zero: bool,
    /// Lookup table for indexed color ([`PixelFormat::Color8`])
    pub lut: Option<ColorLut>,
    /// Physical width of one pixel in `unit`s
    pub pixel_width: f64,
    /// Physical height of one pixel in `unit`s
    pub pixel_height: f64,
    /// Physical depth of one slice in `unit`s
    pub pixel_depth: f64,
    /// Spatial unit name, when calibrated
    pub unit: Option<String>,
    /// Density calibration function, when declared
    pub calibration: Option<CalibrationFunction>,
    /// Density calibration coefficients (up to 5)
    pub coefficients: Vec<f64>,
    /// Unit of calibrated density values
    pub value_unit: Option<String>,
    /// Number of sub-images sharing this directory
    pub n_images: u32,
    /// Seconds between sub-images, when declared
    pub frame_interval: f64,
    /// Application metadata from the first IFD's description
    pub description: Option<String>,
}

impl Default for RasterInfo {
    fn default() -> Self {
        Self {
            pixel_format: PixelFormat::Gray8,
            width: 0,
            height: 0,
            offset: 0,
            long_offset: 0,
            intel_byte_order: false,
            white_is_zero: false,
            lut: None,
            pixel_width: 1.0,
            pixel_height: 1.0,
            pixel_depth: 1.0,
            unit: None,
            calibration: None,
            coefficients: Vec::new(),
            value_unit: None,
            n_images: 1,
            frame_interval: 0.0,
            description: None,
        }
    }
}

impl RasterInfo {
    /// Pixel data offset to skip to, preferring the 64-bit field.
    #[inline]
    pub fn data_offset(&self) -> u64 {
        if self.long_offset > 0 {
            self.long_offset
        } else {
            self.offset as u64
        }
    }
}

// =============================================================================
// Entry points
// =============================================================================

/// Decode every IFD of a TIFF stream.
///
/// The reader is consumed for the whole walk; the caller keeps ownership of
/// the underlying resource and closes it by dropping. The chain walk stops
/// early when a directory declares more than one sub-image (the file is then
/// a resolved stack and further top-level directories are not visited).
///
/// # Errors
/// - [`FormatError::InvalidByteOrder`] when the marker is neither II nor MM
/// - [`FormatError::EmptyDirectory`] when an IFD declares zero entries
/// - [`FormatError::NoDirectories`] when the chain yields no directories
/// - the tag-specific rejections documented on [`FormatError`]
pub fn decode_tiff<R: Read + Seek>(reader: R) -> Result<Vec<RasterInfo>, FormatError> {
    TiffDecoder::new(reader).decode()
}

/// Decode a TIFF stream that must hold exactly one image.
///
/// Fails with [`FormatError::MultiPageUnsupported`] when the chain holds more
/// than one directory or the single directory declares multiple sub-images.
pub fn decode_single<R: Read + Seek>(reader: R) -> Result<RasterInfo, FormatError> {
    let mut infos = decode_tiff(reader)?;
    if infos.len() > 1 {
        return Err(FormatError::MultiPageUnsupported(infos.len()));
    }
    // decode_tiff never returns an empty list
    let info = infos.pop().ok_or(FormatError::NoDirectories)?;
    if info.n_images > 1 {
        return Err(FormatError::MultiPageUnsupported(info.n_images as usize));
    }
    Ok(info)
}

// =============================================================================
// TiffDecoder
// =============================================================================

/// Streaming IFD decoder over any seekable byte source.
///
/// Holds only the stream and the detected byte order; all per-directory
/// state lives in the [`RasterInfo`] being built.
pub struct TiffDecoder<R> {
    reader: R,
    little_endian: bool,
}

impl<R: Read + Seek> TiffDecoder<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            little_endian: false,
        }
    }

    /// Walk the IFD chain. See [`decode_tiff`].
    pub fn decode(mut self) -> Result<Vec<RasterInfo>, FormatError> {
        let marker = self.read_u16_raw()?;
        self.little_endian = match marker {
            BYTE_ORDER_LITTLE_ENDIAN => true,
            BYTE_ORDER_BIG_ENDIAN => false,
            other => return Err(FormatError::InvalidByteOrder(other)),
        };

        // Offsets are treated as signed: some writers terminate the chain
        // with -1 (0xFFFFFFFF) instead of 0, and that must end the walk, not
        // trigger a seek past the end of the stream.
        let mut offset = self.read_u32()? as i32;
        let mut infos = Vec::new();

        while offset > 0 {
            self.seek(offset as u64)?;
            let info = self.decode_ifd(infos.is_empty())?;
            let resolved_stack = info.n_images > 1;
            debug!(
                width = info.width,
                height = info.height,
                format = ?info.pixel_format,
                n_images = info.n_images,
                "decoded image file directory"
            );
            infos.push(info);
            if resolved_stack {
                break;
            }
            offset = self.read_u32()? as i32;
        }

        if infos.is_empty() {
            return Err(FormatError::NoDirectories);
        }
        Ok(infos)
    }

    // -------------------------------------------------------------------------
    // IFD decoding
    // -------------------------------------------------------------------------

    fn decode_ifd(&mut self, first: bool) -> Result<RasterInfo, FormatError> {
        let n_entries = self.read_u16()?;
        if n_entries < 1 {
            return Err(FormatError::EmptyDirectory);
        }

        let mut info = RasterInfo {
            intel_byte_order: self.little_endian,
            ..RasterInfo::default()
        };

        for _ in 0..n_entries {
            let tag = self.read_u16()?;
            let field_type = self.read_u16()?;
            let count = self.read_u32()?;
            let value = self.read_entry_value(field_type, count)?;
            self.dispatch(tag, count, value, first, &mut info)?;
        }

        Ok(info)
    }

    /// Read the 4-byte value field of an entry.
    ///
    /// A single SHORT occupies the first two bytes with a pad short after it;
    /// everything else we consume is read as a full LONG (the value doubles
    /// as an offset for indirect payloads).
    fn read_entry_value(&mut self, field_type: u16, count: u32) -> Result<u32, FormatError> {
        if FieldType::from_u16(field_type) == Some(FieldType::Short) && count == 1 {
            let value = self.read_u16()? as u32;
            let _pad = self.read_u16()?;
            Ok(value)
        } else {
            self.read_u32()
        }
    }

    fn dispatch(
        &mut self,
        tag: u16,
        count: u32,
        value: u32,
        first: bool,
        info: &mut RasterInfo,
    ) -> Result<(), FormatError> {
        let tag = match TiffTag::from_u16(tag) {
            Some(tag) => tag,
            // Unknown tags are ignored, not an error
            None => return Ok(()),
        };

        match tag {
            TiffTag::ImageWidth => info.width = value,
            TiffTag::ImageLength => info.height = value,
            TiffTag::BitsPerSample => self.decode_bits_per_sample(count, value, info)?,
            TiffTag::Compression => {
                if value != COMPRESSION_NONE && value != COMPRESSION_TOLERATED {
                    return Err(FormatError::CompressedData(value));
                }
                if value == COMPRESSION_TOLERATED {
                    // Some writers stamp 7 on uncompressed thumbnails
                    warn!(compression = value, "tolerating mislabeled compression value");
                }
            }
            TiffTag::PhotometricInterpretation => info.white_is_zero = value == 0,
            TiffTag::ImageDescription => {
                if first {
                    self.decode_description(count, value, info)?;
                }
            }
            TiffTag::StripOffsets => {
                info.offset = if count == 1 {
                    value
                } else {
                    // Multi-strip file: contiguous layout assumed, first strip wins
                    let saved = self.position()?;
                    self.seek(value as u64)?;
                    let offset = self.read_u32()?;
                    self.seek(saved)?;
                    offset
                };
                info.long_offset = info.offset as u64;
            }
            TiffTag::SamplesPerPixel => match value {
                1 => {}
                3 => info.pixel_format = PixelFormat::Rgb,
                4 => info.pixel_format = PixelFormat::Argb,
                other => return Err(FormatError::UnsupportedSamplesPerPixel(other)),
            },
            TiffTag::XResolution => {
                let scale = self.read_rational_at(value)?;
                if scale != 0.0 {
                    info.pixel_width = 1.0 / scale;
                }
            }
            TiffTag::YResolution => {
                let scale = self.read_rational_at(value)?;
                if scale != 0.0 {
                    info.pixel_height = 1.0 / scale;
                }
            }
            TiffTag::PlanarConfiguration => {
                if value == 2 && info.pixel_format == PixelFormat::Rgb {
                    info.pixel_format = PixelFormat::RgbPlanar;
                }
            }
            TiffTag::ResolutionUnit => match value {
                1 if info.unit.is_none() => info.unit = Some(" ".to_string()),
                2 => info.unit = Some("inch".to_string()),
                3 => info.unit = Some("cm".to_string()),
                _ => {}
            },
            TiffTag::ColorMap => {
                if count == 768 && info.pixel_format == PixelFormat::Gray8 {
                    self.decode_color_map(value, info)?;
                }
            }
            TiffTag::SampleFormat => {
                if info.pixel_format == PixelFormat::Gray32Int
                    && value == SAMPLE_FORMAT_FLOATING_POINT
                {
                    info.pixel_format = PixelFormat::Gray32Float;
                }
                if info.pixel_format == PixelFormat::Gray16Unsigned && value == SAMPLE_FORMAT_SIGNED
                {
                    info.pixel_format = PixelFormat::Gray16Signed;
                }
            }
            TiffTag::ImageCount => info.n_images = value,
            TiffTag::ExtendedHeader => {
                if count == EXTENDED_HEADER_SIZE {
                    let saved = self.position()?;
                    self.decode_extended_header(value as u64, info)?;
                    self.seek(saved)?;
                }
            }
        }
        Ok(())
    }

    fn decode_bits_per_sample(
        &mut self,
        count: u32,
        value: u32,
        info: &mut RasterInfo,
    ) -> Result<(), FormatError> {
        if count == 1 {
            match value {
                // 8 is the default, nothing to reclassify
                8 => {}
                16 => info.pixel_format = PixelFormat::Gray16Unsigned,
                32 => info.pixel_format = PixelFormat::Gray32Int,
                1 => info.pixel_format = PixelFormat::Bitmap,
                other => return Err(FormatError::UnsupportedBitsPerSample(other)),
            }
        } else if count == 3 {
            // Multi-channel: every channel must be 8 bits
            let saved = self.position()?;
            self.seek(value as u64)?;
            let bit_depth = self.read_u16()?;
            self.seek(saved)?;
            if bit_depth != 8 {
                return Err(FormatError::UnsupportedRgbBitDepth(bit_depth));
            }
        }
        Ok(())
    }

    /// Keep an image description only when it carries application metadata.
    fn decode_description(
        &mut self,
        count: u32,
        value: u32,
        info: &mut RasterInfo,
    ) -> Result<(), FormatError> {
        // The last byte is the terminating NUL; anything shorter than the
        // marker itself cannot carry application metadata
        let len = count.saturating_sub(1);
        if len < 7 {
            return Ok(());
        }
        let saved = self.position()?;
        self.seek(value as u64)?;
        let mut bytes = vec![0u8; len as usize];
        self.reader.read_exact(&mut bytes)?;
        self.seek(saved)?;

        let text = String::from_utf8_lossy(&bytes);
        if text.starts_with(DESCRIPTION_MARKER) {
            info.description = Some(text.into_owned());
        }
        Ok(())
    }

    /// Decode a 768-entry ColorMap into a 256-entry RGB table.
    ///
    /// Entries are 16-bit; only the high byte is kept, which is the second
    /// byte of each pair when the file is little-endian.
    fn decode_color_map(&mut self, offset: u32, info: &mut RasterInfo) -> Result<(), FormatError> {
        let saved = self.position()?;
        self.seek(offset as u64)?;
        let mut table = vec![0u8; 768 * 2];
        self.reader.read_exact(&mut table)?;
        self.seek(saved)?;

        let mut reds = vec![0u8; 256];
        let mut greens = vec![0u8; 256];
        let mut blues = vec![0u8; 256];
        let mut j = usize::from(self.little_endian);
        for i in 0..256 {
            reds[i] = table[j];
            greens[i] = table[512 + j];
            blues[i] = table[1024 + j];
            j += 2;
        }
        info.lut = Some(ColorLut { reds, greens, blues });
        info.pixel_format = PixelFormat::Color8;
        Ok(())
    }

    /// Read a RATIONAL (numerator/denominator pair) stored at an offset.
    ///
    /// A zero denominator yields 0.0, not an error.
    fn read_rational_at(&mut self, offset: u32) -> Result<f64, FormatError> {
        let saved = self.position()?;
        self.seek(offset as u64)?;
        let numerator = self.read_u32()?;
        let denominator = self.read_u32()?;
        self.seek(saved)?;
        if denominator == 0 {
            Ok(0.0)
        } else {
            Ok(numerator as f64 / denominator as f64)
        }
    }

    // -------------------------------------------------------------------------
    // Extended calibration header
    // -------------------------------------------------------------------------

    /// Decode the 256-byte extended calibration header.
    ///
    /// All fields sit at fixed offsets inside the block and are big-endian
    /// regardless of the TIFF byte order.
    fn decode_extended_header(
        &mut self,
        offset: u64,
        info: &mut RasterInfo,
    ) -> Result<(), FormatError> {
        self.seek(offset + 12)?;
        let version = self.read_i16_be()?;

        // Spatial scale
        self.seek(offset + 160)?;
        let scale = self.read_f64_be()?;
        if version > 106 && scale != 0.0 {
            info.pixel_width = 1.0 / scale;
            info.pixel_height = info.pixel_width;
        }

        // Spatial unit
        self.seek(offset + 172)?;
        let mut units = self.read_i16_be()?;
        if version <= 153 {
            units += 5;
        }
        let unit = match units {
            5 => Some("nanometer"),
            6 => Some("micrometer"),
            7 => Some("mm"),
            8 => Some("cm"),
            9 => Some("meter"),
            10 => Some("km"),
            11 => Some("inch"),
            12 => Some("ft"),
            13 => Some("mi"),
            _ => None,
        };
        if let Some(unit) = unit {
            info.unit = Some(unit.to_string());
        }

        // Density calibration
        self.seek(offset + 182)?;
        let fit = self.read_u8()?;
        let _unused = self.read_u8()?;
        let n_coefficients = self.read_i16_be()?;
        if fit == 11 {
            info.calibration = Some(CalibrationFunction::UncalibratedOd);
            info.value_unit = Some("U. OD".to_string());
        } else if fit <= 8 && (1..=5).contains(&n_coefficients) {
            info.calibration = match fit {
                0 => Some(CalibrationFunction::StraightLine),
                1 => Some(CalibrationFunction::Poly2),
                2 => Some(CalibrationFunction::Poly3),
                3 => Some(CalibrationFunction::Poly4),
                5 => Some(CalibrationFunction::Exponential),
                6 => Some(CalibrationFunction::Power),
                7 => Some(CalibrationFunction::Log),
                8 => Some(CalibrationFunction::Rodbard),
                _ => None,
            };
            let mut coefficients = Vec::with_capacity(n_coefficients as usize);
            for _ in 0..n_coefficients {
                coefficients.push(self.read_f64_be()?);
            }
            info.coefficients = coefficients;

            self.seek(offset + 234)?;
            let size = self.read_u8()?;
            if (1..=16).contains(&size) {
                let mut bytes = vec![0u8; size as usize];
                self.reader.read_exact(&mut bytes)?;
                info.value_unit = Some(String::from_utf8_lossy(&bytes).into_owned());
            } else {
                info.value_unit = Some(" ".to_string());
            }
        }

        // Multi-image block, 8-bit data only
        self.seek(offset + 260)?;
        let n_images = self.read_i16_be()?;
        if n_images >= 2
            && matches!(
                info.pixel_format,
                PixelFormat::Gray8 | PixelFormat::Color8
            )
        {
            info.n_images = n_images as u32;
            info.pixel_depth = self.read_f32_be()? as f64;
            let _skipped = self.read_i16_be()?;
            info.frame_interval = self.read_f32_be()? as f64;
        }

        // Aspect ratio correction
        self.seek(offset + 272)?;
        let aspect_ratio = self.read_f32_be()?;
        if version > 140 && aspect_ratio != 0.0 {
            info.pixel_height = info.pixel_width / aspect_ratio as f64;
        }

        Ok(())
    }

    // -------------------------------------------------------------------------
    // Primitive reads
    // -------------------------------------------------------------------------

    fn position(&mut self) -> Result<u64, FormatError> {
        Ok(self.reader.stream_position()?)
    }

    fn seek(&mut self, pos: u64) -> Result<(), FormatError> {
        self.reader.seek(SeekFrom::Start(pos))?;
        Ok(())
    }

    fn read_u8(&mut self) -> Result<u8, FormatError> {
        let mut buf = [0u8; 1];
        self.reader.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    /// Read a u16 ignoring the detected byte order (used for the marker).
    fn read_u16_raw(&mut self) -> Result<u16, FormatError> {
        let mut buf = [0u8; 2];
        self.reader.read_exact(&mut buf)?;
        Ok(u16::from_be_bytes(buf))
    }

    fn read_u16(&mut self) -> Result<u16, FormatError> {
        let mut buf = [0u8; 2];
        self.reader.read_exact(&mut buf)?;
        Ok(if self.little_endian {
            u16::from_le_bytes(buf)
        } else {
            u16::from_be_bytes(buf)
        })
    }

    fn read_u32(&mut self) -> Result<u32, FormatError> {
        let mut buf = [0u8; 4];
        self.reader.read_exact(&mut buf)?;
        Ok(if self.little_endian {
            u32::from_le_bytes(buf)
        } else {
            u32::from_be_bytes(buf)
        })
    }

    fn read_i16_be(&mut self) -> Result<i16, FormatError> {
        let mut buf = [0u8; 2];
        self.reader.read_exact(&mut buf)?;
        Ok(i16::from_be_bytes(buf))
    }

    fn read_f32_be(&mut self) -> Result<f32, FormatError> {
        let mut buf = [0u8; 4];
        self.reader.read_exact(&mut buf)?;
        Ok(f32::from_be_bytes(buf))
    }

    fn read_f64_be(&mut self) -> Result<f64, FormatError> {
        let mut buf = [0u8; 8];
        self.reader.read_exact(&mut buf)?;
        Ok(f64::from_be_bytes(buf))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiff::test_fixtures::{Entry, TiffBuilder, ASCII, LONG, SHORT};
    use std::io::Cursor;

    fn decode(bytes: Vec<u8>) -> Result<Vec<RasterInfo>, FormatError> {
        decode_tiff(Cursor::new(bytes))
    }

    fn gray8_entries(width: u32, height: u32, offset: u32) -> Vec<Entry> {
        vec![
            Entry::short(TiffTag::ImageWidth, width as u16),
            Entry::short(TiffTag::ImageLength, height as u16),
            Entry::short(TiffTag::BitsPerSample, 8),
            Entry::long(TiffTag::StripOffsets, offset),
            Entry::short(TiffTag::SamplesPerPixel, 1),
        ]
    }

    // -------------------------------------------------------------------------
    // Header Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_decode_gray8_little_endian() {
        let bytes = TiffBuilder::little_endian()
            .ifd(gray8_entries(64, 32, 1000))
            .build();
        let infos = decode(bytes).unwrap();
        assert_eq!(infos.len(), 1);
        let info = &infos[0];
        assert_eq!(info.pixel_format, PixelFormat::Gray8);
        assert_eq!((info.width, info.height), (64, 32));
        assert_eq!(info.offset, 1000);
        assert_eq!(info.data_offset(), 1000);
        assert!(info.intel_byte_order);
    }

    #[test]
    fn test_decode_gray8_big_endian() {
        let bytes = TiffBuilder::big_endian()
            .ifd(gray8_entries(64, 32, 1000))
            .build();
        let infos = decode(bytes).unwrap();
        assert_eq!(infos[0].pixel_format, PixelFormat::Gray8);
        assert_eq!((infos[0].width, infos[0].height), (64, 32));
        assert!(!infos[0].intel_byte_order);
    }

    #[test]
    fn test_decode_invalid_byte_order() {
        let bytes = vec![0x00, 0x2A, 0x06, 0x00, 0x00, 0x00];
        assert!(matches!(
            decode(bytes),
            Err(FormatError::InvalidByteOrder(0x002A))
        ));
    }

    #[test]
    fn test_decode_zero_first_offset() {
        // A valid marker pointing nowhere yields no directories
        let bytes = vec![0x49, 0x49, 0x00, 0x00, 0x00, 0x00];
        assert!(matches!(decode(bytes), Err(FormatError::NoDirectories)));
    }

    #[test]
    fn test_decode_empty_directory() {
        let bytes = TiffBuilder::little_endian().ifd(Vec::new()).build();
        assert!(matches!(decode(bytes), Err(FormatError::EmptyDirectory)));
    }

    // -------------------------------------------------------------------------
    // Pixel Format Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_decode_bitmap() {
        let bytes = TiffBuilder::little_endian()
            .ifd(vec![
                Entry::short(TiffTag::ImageWidth, 17),
                Entry::short(TiffTag::ImageLength, 4),
                Entry::short(TiffTag::BitsPerSample, 1),
                Entry::long(TiffTag::StripOffsets, 200),
            ])
            .build();
        let infos = decode(bytes).unwrap();
        assert_eq!(infos[0].pixel_format, PixelFormat::Bitmap);
    }

    #[test]
    fn test_decode_unsupported_bits_per_sample() {
        let bytes = TiffBuilder::little_endian()
            .ifd(vec![Entry::short(TiffTag::BitsPerSample, 12)])
            .build();
        assert!(matches!(
            decode(bytes),
            Err(FormatError::UnsupportedBitsPerSample(12))
        ));
    }

    #[test]
    fn test_decode_rgb() {
        let bytes = TiffBuilder::little_endian()
            .ifd(vec![
                Entry::short(TiffTag::ImageWidth, 8),
                Entry::short(TiffTag::ImageLength, 8),
                Entry::long(TiffTag::StripOffsets, 400),
                Entry::short(TiffTag::SamplesPerPixel, 3),
            ])
            .build();
        assert_eq!(decode(bytes).unwrap()[0].pixel_format, PixelFormat::Rgb);
    }

    #[test]
    fn test_decode_argb() {
        let bytes = TiffBuilder::little_endian()
            .ifd(vec![Entry::short(TiffTag::SamplesPerPixel, 4)])
            .build();
        assert_eq!(decode(bytes).unwrap()[0].pixel_format, PixelFormat::Argb);
    }

    #[test]
    fn test_decode_unsupported_samples_per_pixel() {
        let bytes = TiffBuilder::little_endian()
            .ifd(vec![Entry::short(TiffTag::SamplesPerPixel, 5)])
            .build();
        assert!(matches!(
            decode(bytes),
            Err(FormatError::UnsupportedSamplesPerPixel(5))
        ));
    }

    #[test]
    fn test_decode_planar_rgb() {
        // PlanarConfiguration 2 reclassifies an established Rgb
        let bytes = TiffBuilder::little_endian()
            .ifd(vec![
                Entry::short(TiffTag::SamplesPerPixel, 3),
                Entry::short(TiffTag::PlanarConfiguration, 2),
            ])
            .build();
        assert_eq!(
            decode(bytes).unwrap()[0].pixel_format,
            PixelFormat::RgbPlanar
        );
    }

    #[test]
    fn test_decode_planar_ignored_on_gray() {
        let bytes = TiffBuilder::little_endian()
            .ifd(vec![
                Entry::short(TiffTag::BitsPerSample, 8),
                Entry::short(TiffTag::PlanarConfiguration, 2),
            ])
            .build();
        assert_eq!(decode(bytes).unwrap()[0].pixel_format, PixelFormat::Gray8);
    }

    #[test]
    fn test_decode_rgb_bit_depth_check() {
        // BitsPerSample with count 3 points at three shorts; first must be 8
        let mut builder = TiffBuilder::little_endian();
        let offset = builder.tail_offset();
        let bytes = builder
            .ifd(vec![
                Entry::short(TiffTag::SamplesPerPixel, 3),
                Entry::new(TiffTag::BitsPerSample, SHORT, 3, offset),
            ])
            .tail(&[16, 0, 16, 0, 16, 0])
            .build();
        assert!(matches!(
            decode(bytes),
            Err(FormatError::UnsupportedRgbBitDepth(16))
        ));
    }

    #[test]
    fn test_decode_sample_format_reclassifies() {
        let bytes = TiffBuilder::little_endian()
            .ifd(vec![
                Entry::short(TiffTag::BitsPerSample, 16),
                Entry::short(TiffTag::SampleFormat, 2),
            ])
            .build();
        assert_eq!(
            decode(bytes).unwrap()[0].pixel_format,
            PixelFormat::Gray16Signed
        );

        let bytes = TiffBuilder::little_endian()
            .ifd(vec![
                Entry::short(TiffTag::BitsPerSample, 32),
                Entry::short(TiffTag::SampleFormat, 3),
            ])
            .build();
        assert_eq!(
            decode(bytes).unwrap()[0].pixel_format,
            PixelFormat::Gray32Float
        );
    }

    #[test]
    fn test_decode_sample_format_needs_prior_bits() {
        // Without a 16/32-bit reclassification target the tag is inert
        let bytes = TiffBuilder::little_endian()
            .ifd(vec![Entry::short(TiffTag::SampleFormat, 2)])
            .build();
        assert_eq!(decode(bytes).unwrap()[0].pixel_format, PixelFormat::Gray8);
    }

    // -------------------------------------------------------------------------
    // Compression Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_decode_rejects_lzw() {
        let bytes = TiffBuilder::little_endian()
            .ifd(vec![Entry::short(TiffTag::Compression, 5)])
            .build();
        assert!(matches!(
            decode(bytes),
            Err(FormatError::CompressedData(5))
        ));
    }

    #[test]
    fn test_decode_tolerates_compression_seven() {
        let bytes = TiffBuilder::little_endian()
            .ifd(vec![
                Entry::short(TiffTag::BitsPerSample, 8),
                Entry::short(TiffTag::Compression, 7),
            ])
            .build();
        assert!(decode(bytes).is_ok());
    }

    #[test]
    fn test_decode_accepts_uncompressed() {
        let bytes = TiffBuilder::little_endian()
            .ifd(vec![Entry::short(TiffTag::Compression, 1)])
            .build();
        assert!(decode(bytes).is_ok());
    }

    // -------------------------------------------------------------------------
    // Indirect Value Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_decode_multi_strip_offsets() {
        // count > 1: the value is an offset to an array; the first entry wins
        let mut builder = TiffBuilder::little_endian();
        let offset = builder.tail_offset();
        let bytes = builder
            .ifd(vec![Entry::new(TiffTag::StripOffsets, LONG, 2, offset)])
            .tail(&[0xE8, 0x03, 0x00, 0x00, 0xD0, 0x07, 0x00, 0x00])
            .build();
        assert_eq!(decode(bytes).unwrap()[0].offset, 1000);
    }

    #[test]
    fn test_decode_resolution() {
        let mut builder = TiffBuilder::little_endian();
        let offset = builder.tail_offset();
        let bytes = builder
            .ifd(vec![
                Entry::new(TiffTag::XResolution, 5, 1, offset),
                Entry::short(TiffTag::ResolutionUnit, 2),
            ])
            // numerator 4, denominator 1 -> scale 4 -> pixel width 0.25
            .tail(&[4, 0, 0, 0, 1, 0, 0, 0])
            .build();
        let info = &decode(bytes).unwrap()[0];
        assert!((info.pixel_width - 0.25).abs() < 1e-9);
        assert_eq!(info.unit.as_deref(), Some("inch"));
    }

    #[test]
    fn test_decode_resolution_zero_denominator() {
        // Zero denominator yields scale 0.0; pixel width stays at its default
        let mut builder = TiffBuilder::little_endian();
        let offset = builder.tail_offset();
        let bytes = builder
            .ifd(vec![Entry::new(TiffTag::XResolution, 5, 1, offset)])
            .tail(&[4, 0, 0, 0, 0, 0, 0, 0])
            .build();
        let info = &decode(bytes).unwrap()[0];
        assert_eq!(info.pixel_width, 1.0);
    }

    #[test]
    fn test_decode_resolution_unit_one_keeps_existing() {
        let bytes = TiffBuilder::little_endian()
            .ifd(vec![Entry::short(TiffTag::ResolutionUnit, 1)])
            .build();
        assert_eq!(decode(bytes).unwrap()[0].unit.as_deref(), Some(" "));
    }

    #[test]
    fn test_decode_color_map() {
        let mut table = vec![0u8; 768 * 2];
        // Little-endian 16-bit entries: high byte is the second of each pair.
        // Entry 0 of the red channel = 0xAB00 -> red[0] = 0xAB.
        table[1] = 0xAB;
        table[512 + 1] = 0xCD;
        table[1024 + 1] = 0xEF;
        let mut builder = TiffBuilder::little_endian();
        let offset = builder.tail_offset();
        let bytes = builder
            .ifd(vec![
                Entry::short(TiffTag::BitsPerSample, 8),
                Entry::new(TiffTag::ColorMap, SHORT, 768, offset),
            ])
            .tail(&table)
            .build();
        let info = &decode(bytes).unwrap()[0];
        assert_eq!(info.pixel_format, PixelFormat::Color8);
        let lut = info.lut.as_ref().unwrap();
        assert_eq!(lut.reds[0], 0xAB);
        assert_eq!(lut.greens[0], 0xCD);
        assert_eq!(lut.blues[0], 0xEF);
    }

    #[test]
    fn test_decode_color_map_ignored_on_rgb() {
        let mut builder = TiffBuilder::little_endian();
        let offset = builder.tail_offset();
        let bytes = builder
            .ifd(vec![
                Entry::short(TiffTag::SamplesPerPixel, 3),
                Entry::new(TiffTag::ColorMap, SHORT, 768, offset),
            ])
            .tail(&vec![0u8; 768 * 2])
            .build();
        assert_eq!(decode(bytes).unwrap()[0].pixel_format, PixelFormat::Rgb);
    }

    #[test]
    fn test_decode_description_with_marker() {
        let text = b"ImageJ=1.54\nimages=1\0";
        let mut builder = TiffBuilder::little_endian();
        let offset = builder.tail_offset();
        let bytes = builder
            .ifd(vec![Entry::new(
                TiffTag::ImageDescription,
                ASCII,
                text.len() as u32,
                offset,
            )])
            .tail(text)
            .build();
        let info = &decode(bytes).unwrap()[0];
        assert!(info.description.as_deref().unwrap().starts_with("ImageJ="));
    }

    #[test]
    fn test_decode_description_without_marker_ignored() {
        let text = b"made with gimp\0";
        let mut builder = TiffBuilder::little_endian();
        let offset = builder.tail_offset();
        let bytes = builder
            .ifd(vec![Entry::new(
                TiffTag::ImageDescription,
                ASCII,
                text.len() as u32,
                offset,
            )])
            .tail(text)
            .build();
        assert_eq!(decode(bytes).unwrap()[0].description, None);
    }

    #[test]
    fn test_decode_description_bare_marker_too_short() {
        // "ImageJ\0" is the marker alone with no metadata behind it
        let text = b"ImageJ\0";
        let mut builder = TiffBuilder::little_endian();
        let offset = builder.tail_offset();
        let bytes = builder
            .ifd(vec![Entry::new(
                TiffTag::ImageDescription,
                ASCII,
                text.len() as u32,
                offset,
            )])
            .tail(text)
            .build();
        assert_eq!(decode(bytes).unwrap()[0].description, None);
    }

    // -------------------------------------------------------------------------
    // Chain Walk Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_decode_two_directory_chain() {
        let bytes = TiffBuilder::little_endian()
            .ifd(gray8_entries(8, 8, 500))
            .ifd(gray8_entries(4, 4, 600))
            .build();
        let infos = decode(bytes).unwrap();
        assert_eq!(infos.len(), 2);
        assert_eq!(infos[0].width, 8);
        assert_eq!(infos[1].width, 4);
    }

    #[test]
    fn test_decode_minus_one_chain_terminator() {
        // Some writers end the chain with -1 instead of 0; the walk must
        // stop cleanly with the directory already decoded.
        let mut bytes = TiffBuilder::little_endian()
            .ifd(gray8_entries(8, 8, 500))
            .build();
        // Next-offset field of the single 5-entry directory
        let next = 42 + 2 + 12 * 5;
        bytes[next..next + 4].copy_from_slice(&[0xFF; 4]);
        let infos = decode(bytes).unwrap();
        assert_eq!(infos.len(), 1);
        assert_eq!(infos[0].width, 8);
    }

    #[test]
    fn test_decode_image_count_stops_chain() {
        // A directory declaring multiple sub-images is a resolved stack;
        // the second top-level directory must not be visited.
        let mut first = gray8_entries(8, 8, 500);
        first.push(Entry::long(TiffTag::ImageCount, 5));
        let bytes = TiffBuilder::little_endian()
            .ifd(first)
            .ifd(gray8_entries(4, 4, 600))
            .build();
        let infos = decode(bytes).unwrap();
        assert_eq!(infos.len(), 1);
        assert_eq!(infos[0].n_images, 5);
    }

    #[test]
    fn test_decode_single_accepts_one_page() {
        let bytes = TiffBuilder::little_endian()
            .ifd(gray8_entries(8, 8, 500))
            .build();
        let info = decode_single(Cursor::new(bytes)).unwrap();
        assert_eq!(info.width, 8);
    }

    #[test]
    fn test_decode_single_rejects_chain() {
        let bytes = TiffBuilder::little_endian()
            .ifd(gray8_entries(8, 8, 500))
            .ifd(gray8_entries(4, 4, 600))
            .build();
        assert!(matches!(
            decode_single(Cursor::new(bytes)),
            Err(FormatError::MultiPageUnsupported(2))
        ));
    }

    #[test]
    fn test_decode_single_rejects_stack() {
        let mut entries = gray8_entries(8, 8, 500);
        entries.push(Entry::long(TiffTag::ImageCount, 3));
        let bytes = TiffBuilder::little_endian().ifd(entries).build();
        assert!(matches!(
            decode_single(Cursor::new(bytes)),
            Err(FormatError::MultiPageUnsupported(3))
        ));
    }

    // -------------------------------------------------------------------------
    // Extended Header Tests
    // -------------------------------------------------------------------------

    fn extended_header(version: i16) -> Vec<u8> {
        // The decoder reads fixed fields up to offset 276, past the nominal
        // 256-byte header, so the fixture must extend that far.
        let mut block = vec![0u8; 276];
        block[12..14].copy_from_slice(&version.to_be_bytes());
        block
    }

    #[test]
    fn test_extended_header_spatial_scale() {
        let mut block = extended_header(150);
        // scale 10.0 -> pixel width and height 0.1
        block[160..168].copy_from_slice(&10.0f64.to_be_bytes());
        // unit code 2 (+5 for old versions) -> mm
        block[172..174].copy_from_slice(&2i16.to_be_bytes());
        let mut builder = TiffBuilder::little_endian();
        let offset = builder.tail_offset();
        let bytes = builder
            .ifd(vec![
                Entry::short(TiffTag::BitsPerSample, 8),
                Entry::new(TiffTag::ExtendedHeader, LONG, 256, offset),
            ])
            .tail(&block)
            .build();
        let info = &decode(bytes).unwrap()[0];
        assert!((info.pixel_width - 0.1).abs() < 1e-9);
        assert!((info.pixel_height - 0.1).abs() < 1e-9);
        assert_eq!(info.unit.as_deref(), Some("mm"));
    }

    #[test]
    fn test_extended_header_density_calibration() {
        let mut block = extended_header(160);
        block[182] = 0; // straight line
        block[184..186].copy_from_slice(&2i16.to_be_bytes());
        block[186..194].copy_from_slice(&1.5f64.to_be_bytes());
        block[194..202].copy_from_slice(&0.25f64.to_be_bytes());
        block[234] = 2;
        block[235] = b'O';
        block[236] = b'D';
        let mut builder = TiffBuilder::little_endian();
        let offset = builder.tail_offset();
        let bytes = builder
            .ifd(vec![
                Entry::short(TiffTag::BitsPerSample, 8),
                Entry::new(TiffTag::ExtendedHeader, LONG, 256, offset),
            ])
            .tail(&block)
            .build();
        let info = &decode(bytes).unwrap()[0];
        assert_eq!(info.calibration, Some(CalibrationFunction::StraightLine));
        assert_eq!(info.coefficients, vec![1.5, 0.25]);
        assert_eq!(info.value_unit.as_deref(), Some("OD"));
    }

    #[test]
    fn test_extended_header_uncalibrated_od() {
        let mut block = extended_header(160);
        block[182] = 11;
        let mut builder = TiffBuilder::little_endian();
        let offset = builder.tail_offset();
        let bytes = builder
            .ifd(vec![
                Entry::short(TiffTag::BitsPerSample, 8),
                Entry::new(TiffTag::ExtendedHeader, LONG, 256, offset),
            ])
            .tail(&block)
            .build();
        let info = &decode(bytes).unwrap()[0];
        assert_eq!(info.calibration, Some(CalibrationFunction::UncalibratedOd));
        assert_eq!(info.value_unit.as_deref(), Some("U. OD"));
    }

    #[test]
    fn test_extended_header_multi_image_block() {
        let mut block = extended_header(160);
        block[260..262].copy_from_slice(&4i16.to_be_bytes());
        block[262..266].copy_from_slice(&2.0f32.to_be_bytes());
        block[268..272].copy_from_slice(&0.5f32.to_be_bytes());
        let mut builder = TiffBuilder::little_endian();
        let offset = builder.tail_offset();
        let bytes = builder
            .ifd(vec![
                Entry::short(TiffTag::BitsPerSample, 8),
                Entry::new(TiffTag::ExtendedHeader, LONG, 256, offset),
            ])
            .tail(&block)
            .build();
        let info = &decode(bytes).unwrap()[0];
        assert_eq!(info.n_images, 4);
        assert!((info.pixel_depth - 2.0).abs() < 1e-6);
        assert!((info.frame_interval - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_extended_header_aspect_ratio() {
        let mut block = extended_header(160);
        block[160..168].copy_from_slice(&10.0f64.to_be_bytes());
        block[272..276].copy_from_slice(&2.0f32.to_be_bytes());
        let mut builder = TiffBuilder::little_endian();
        let offset = builder.tail_offset();
        let bytes = builder
            .ifd(vec![
                Entry::short(TiffTag::BitsPerSample, 8),
                Entry::new(TiffTag::ExtendedHeader, LONG, 256, offset),
            ])
            .tail(&block)
            .build();
        let info = &decode(bytes).unwrap()[0];
        assert!((info.pixel_width - 0.1).abs() < 1e-9);
        assert!((info.pixel_height - 0.05).abs() < 1e-9);
    }

    #[test]
    fn test_extended_header_wrong_size_ignored() {
        let bytes = TiffBuilder::little_endian()
            .ifd(vec![
                Entry::short(TiffTag::BitsPerSample, 8),
                Entry::new(TiffTag::ExtendedHeader, LONG, 100, 9999),
            ])
            .build();
        // Count != 256: the block is not followed, so the bogus offset is harmless
        assert!(decode(bytes).is_ok());
    }
}

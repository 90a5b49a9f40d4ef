//! TIFF tag and field type definitions.
//!
//! This module defines the vocabulary for TIFF directory decoding:
//! - Field types that determine how entry values are encoded
//! - Tag IDs that identify metadata fields
//! - Sample format and compression value sets
//!
//! Only classic TIFF is in scope. The vendor tags at the bottom carry the
//! extended calibration block and multi-image count written by scientific
//! imaging tools; their payloads are decoded in `tiff::decoder`.

// =============================================================================
// TIFF Field Types
// =============================================================================

/// TIFF field types that determine how entry values are encoded.
///
/// The decoder only needs to distinguish SHORT from everything else: a
/// single SHORT is stored in the first two bytes of the four-byte value
/// field with a pad short after it, while every other scalar we consume is
/// read as a full LONG. Types not listed here are treated as LONG-shaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum FieldType {
    /// Unsigned 8-bit integer (1 byte)
    Byte = 1,

    /// 8-bit ASCII character (1 byte)
    Ascii = 2,

    /// Unsigned 16-bit integer (2 bytes)
    Short = 3,

    /// Unsigned 32-bit integer (4 bytes)
    Long = 4,

    /// Two LONGs forming numerator/denominator (8 bytes)
    Rational = 5,
}

impl FieldType {
    /// Create a FieldType from its numeric value.
    ///
    /// Returns `None` for unrecognized type values; the decoder falls back
    /// to LONG-shaped reads for those.
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            1 => Some(FieldType::Byte),
            2 => Some(FieldType::Ascii),
            3 => Some(FieldType::Short),
            4 => Some(FieldType::Long),
            5 => Some(FieldType::Rational),
            _ => None,
        }
    }

    /// Get the numeric type ID.
    #[inline]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }
}

// =============================================================================
// TIFF Tags
// =============================================================================

/// TIFF tag IDs relevant to uncompressed raster decoding.
///
/// Tags are 16-bit identifiers that describe the type of metadata in an IFD
/// entry. We define only the tags the directory decoder consumes; everything
/// else is ignored during decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum TiffTag {
    // -------------------------------------------------------------------------
    // Basic Image Structure
    // -------------------------------------------------------------------------
    /// Image width in pixels
    ImageWidth = 256,

    /// Image height (length) in pixels
    ImageLength = 257,

    /// Bits per sample; selects the pixel format
    BitsPerSample = 258,

    /// Compression scheme used
    Compression = 259,

    /// Photometric interpretation (0 = white-is-zero)
    PhotometricInterpretation = 262,

    /// Description string (application metadata in the first IFD)
    ImageDescription = 270,

    /// Byte offset(s) of the pixel data strips
    StripOffsets = 273,

    /// Number of components per pixel (1, 3 or 4)
    SamplesPerPixel = 277,

    /// How components are organized (1 = chunky, 2 = planar)
    PlanarConfiguration = 284,

    // -------------------------------------------------------------------------
    // Calibration and Resolution
    // -------------------------------------------------------------------------
    /// Pixels per unit in X direction (RATIONAL)
    XResolution = 282,

    /// Pixels per unit in Y direction (RATIONAL)
    YResolution = 283,

    /// Unit of resolution (1 = none, 2 = inch, 3 = centimeter)
    ResolutionUnit = 296,

    /// RGB lookup table for indexed images (768 SHORTs)
    ColorMap = 320,

    /// How to interpret each sample (unsigned/signed/float)
    SampleFormat = 339,

    // -------------------------------------------------------------------------
    // Vendor Extensions
    // -------------------------------------------------------------------------
    /// Number of sub-images in the file
    ImageCount = 34122,

    /// 256-byte extended calibration header
    ExtendedHeader = 43314,
}

impl TiffTag {
    /// Create a TiffTag from its numeric value.
    ///
    /// Returns `None` for unrecognized tags. Unknown tags are not an error;
    /// they are simply ignored during decoding.
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            256 => Some(TiffTag::ImageWidth),
            257 => Some(TiffTag::ImageLength),
            258 => Some(TiffTag::BitsPerSample),
            259 => Some(TiffTag::Compression),
            262 => Some(TiffTag::PhotometricInterpretation),
            270 => Some(TiffTag::ImageDescription),
            273 => Some(TiffTag::StripOffsets),
            277 => Some(TiffTag::SamplesPerPixel),
            282 => Some(TiffTag::XResolution),
            283 => Some(TiffTag::YResolution),
            284 => Some(TiffTag::PlanarConfiguration),
            296 => Some(TiffTag::ResolutionUnit),
            320 => Some(TiffTag::ColorMap),
            339 => Some(TiffTag::SampleFormat),
            34122 => Some(TiffTag::ImageCount),
            43314 => Some(TiffTag::ExtendedHeader),
            _ => None,
        }
    }

    /// Get the numeric tag ID.
    #[inline]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }
}

// =============================================================================
// Sample Format Values
// =============================================================================

/// SampleFormat tag values the decoder reacts to.
///
/// SIGNED reclassifies 16-bit data as signed; FLOATING_POINT reclassifies
/// 32-bit data as IEEE float. Every other value leaves the format alone.
pub const SAMPLE_FORMAT_SIGNED: u32 = 2;
pub const SAMPLE_FORMAT_FLOATING_POINT: u32 = 3;

// =============================================================================
// Compression Values
// =============================================================================

/// Compression value for uncompressed data, the only scheme actually decoded.
pub const COMPRESSION_NONE: u32 = 1;

/// Compression value tolerated without rejection.
///
/// Some writers stamp this on data that is stored uncompressed; the decoder
/// accepts it and logs a warning instead of failing.
pub const COMPRESSION_TOLERATED: u32 = 7;

// =============================================================================
// Tests
// =============================================================================

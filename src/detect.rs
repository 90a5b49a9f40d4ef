//! File type detection based on magic numbers.
//!
//! Classifies a byte buffer by looking at 'magic numbers' in the file header.
//! The checks run against the first four bytes (plus byte 128 for DICOM), so
//! callers should hand in at least the first 132 bytes of the file when they
//! have them; shorter buffers simply cannot match the deeper probes.
//!
//! Classification never fails: anything unrecognized is [`FileType::Unknown`].
//!
//! Two of the checks are deliberately loose and kept that way for
//! compatibility with the files this library historically accepted:
//!
//! - The ACR/NEMA probe (first DICOM group tag 0002 or 0008) can match short
//!   or coincidentally shaped binaries.
//! - The BMP probe is only the two-byte `BM` prefix.

// =============================================================================
// FileType
// =============================================================================

/// Detected file type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    /// No signature matched, or fewer than 4 bytes were available
    Unknown,
    /// JPEG (SOI marker `FF D8 FF`)
    Jpeg,
    /// PNG (`89 50 4E 47`)
    Png,
    /// TIFF, either byte order (`II*\0` or `MM\0*`)
    Tiff,
    /// GIF (`GIF8`)
    Gif,
    /// Windows bitmap (`BM`)
    Bmp,
    /// Portable graymap (`P2` or `P5` followed by whitespace)
    Pgm,
    /// DICOM (`DICM` at offset 128, or the ACR/NEMA first-tag heuristic)
    Dicom,
    /// PDF (`%PDF`)
    Pdf,
}

impl FileType {
    /// MIME type conventionally associated with this classification.
    pub const fn mime_type(self) -> &'static str {
        match self {
            FileType::Unknown => "application/octet-stream",
            FileType::Jpeg => "image/jpeg",
            FileType::Png => "image/png",
            FileType::Tiff => "image/tiff",
            FileType::Gif => "image/gif",
            FileType::Bmp => "image/bmp",
            FileType::Pgm => "image/x-portable-graymap",
            FileType::Dicom => "application/dicom",
            FileType::Pdf => "application/pdf",
        }
    }
}

// =============================================================================
// Classification
// =============================================================================

/// Number of header bytes needed for every probe, including the DICOM
/// preamble check at offset 128.
pub const HEADER_BYTES: usize = 132;

/// Classify a byte buffer by its magic number.
///
/// The buffer should hold the first [`HEADER_BYTES`] bytes of the file;
/// shorter buffers are fine but skip the probes they cannot reach. Checks
/// run in a fixed order and the first match wins.
///
/// This is a pure function of the buffer contents; it never fails.
pub fn classify(buf: &[u8]) -> FileType {
    if buf.len() < 4 {
        return FileType::Unknown;
    }

    let b0 = buf[0];
    let b1 = buf[1];
    let b2 = buf[2];
    let b3 = buf[3];

    // PDF (%PDF-1.X)
    if b0 == b'%' && b1 == b'P' && b2 == b'D' && b3 == b'F' {
        return FileType::Pdf;
    }

    // PNG
    if b0 == 137 && b1 == 80 && b2 == 78 && b3 == 71 {
        return FileType::Png;
    }

    // Little-endian TIFF ("II")
    if b0 == 73 && b1 == 73 && b2 == 42 && b3 == 0 {
        return FileType::Tiff;
    }

    // Big-endian TIFF ("MM")
    if b0 == 77 && b1 == 77 && b2 == 0 && b3 == 42 {
        return FileType::Tiff;
    }

    // JPEG (SOI marker, first three bytes only)
    if b0 == 255 && b1 == 216 && b2 == 255 {
        return FileType::Jpeg;
    }

    // GIF ("GIF8")
    if b0 == 71 && b1 == 73 && b2 == 70 && b3 == 56 {
        return FileType::Gif;
    }

    // DICOM ("DICM" at offset 128)
    if buf.len() >= HEADER_BYTES && buf[128] == 68 && buf[129] == 73 && buf[130] == 67 && buf[131] == 77 {
        return FileType::Dicom;
    }

    // ACR/NEMA with first tag = 0002,00xx or 0008,00xx
    if (b0 == 8 || b0 == 2) && b1 == 0 && b3 == 0 {
        return FileType::Dicom;
    }

    // PGM ("P2" or "P5" followed by whitespace)
    if b0 == 80 && (b1 == 50 || b1 == 53) && (b2 == 10 || b2 == 13 || b2 == 32 || b2 == 9) {
        return FileType::Pgm;
    }

    // BMP ("BM")
    if b0 == 66 && b1 == 77 {
        return FileType::Bmp;
    }

    FileType::Unknown
}

/// Whether the surrounding codec layer can decode this type as a raster
/// image.
///
/// Only JPEG and PNG qualify; everything else is either an opaque document
/// (PDF), a format handled by the native TIFF decoder, or unsupported.
pub const fn is_supported_image(file_type: FileType) -> bool {
    matches!(file_type, FileType::Jpeg | FileType::Png)
}

// =============================================================================
// Tests
// =============================================================================

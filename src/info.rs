//! File summary probing.
//!
//! Combines the sniffer, the external codec and the native TIFF decoder to
//! answer "what is this file" without materializing pixels: classification,
//! MIME type, and where a decoder is wired for the format, dimensions and
//! bit depth. Formats without a wired decoder still get a classification.

use std::io::Cursor;

use image::ImageFormat;
use tracing::warn;

use crate::detect::{classify, FileType};
use crate::error::FormatError;
use crate::tiff::decode_tiff;

// =============================================================================
// FileSummary
// =============================================================================

/// What a byte stream turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSummary {
    /// Magic-number classification
    pub file_type: FileType,
    /// MIME type for the classification
    pub mime_type: &'static str,
    /// Image width in pixels; 0 when no decoder is wired for the format
    pub width: u32,
    /// Image height in pixels; 0 when no decoder is wired for the format
    pub height: u32,
    /// Storage bits per pixel; 0 when unknown
    pub bits_per_pixel: u32,
}

impl FileSummary {
    fn bare(file_type: FileType) -> Self {
        Self {
            file_type,
            mime_type: file_type.mime_type(),
            width: 0,
            height: 0,
            bits_per_pixel: 0,
        }
    }
}

// =============================================================================
// Probing
// =============================================================================

/// Probe a byte buffer for classification and geometry.
///
/// JPEG and PNG go through the external codec; TIFF goes through the native
/// directory decoder (first directory wins) and its structural errors
/// propagate. Every other classification, and codec-level decode failures on
/// a correctly classified JPEG/PNG, yield a summary with zero dimensions.
pub fn fetch_file_info(input: &[u8]) -> Result<FileSummary, FormatError> {
    let file_type = classify(input);
    let mut summary = FileSummary::bare(file_type);

    match file_type {
        FileType::Jpeg | FileType::Png => {
            let format = if file_type == FileType::Jpeg {
                ImageFormat::Jpeg
            } else {
                ImageFormat::Png
            };
            match image::load_from_memory_with_format(input, format) {
                Ok(img) => {
                    summary.width = img.width();
                    summary.height = img.height();
                    summary.bits_per_pixel = img.color().bits_per_pixel() as u32;
                }
                Err(error) => {
                    warn!(%error, mime = summary.mime_type, "classified image failed to decode");
                }
            }
        }
        FileType::Tiff => {
            let infos = decode_tiff(Cursor::new(input))?;
            let info = &infos[0];
            summary.width = info.width;
            summary.height = info.height;
            summary.bits_per_pixel = info.pixel_format.bits_per_pixel();
        }
        _ => {}
    }

    Ok(summary)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiff::tags::TiffTag;
    use crate::tiff::test_fixtures::{Entry, TiffBuilder};
    use image::{DynamicImage, GrayImage};

    #[test]
    fn test_fetch_png_summary() {
        let img = DynamicImage::ImageLuma8(GrayImage::new(20, 10));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        let summary = fetch_file_info(&buf).unwrap();
        assert_eq!(summary.file_type, FileType::Png);
        assert_eq!(summary.mime_type, "image/png");
        assert_eq!((summary.width, summary.height), (20, 10));
        assert_eq!(summary.bits_per_pixel, 8);
    }

    #[test]
    fn test_fetch_tiff_summary() {
        let bytes = TiffBuilder::little_endian()
            .ifd(vec![
                Entry::short(TiffTag::ImageWidth, 40),
                Entry::short(TiffTag::ImageLength, 30),
                Entry::short(TiffTag::BitsPerSample, 16),
                Entry::long(TiffTag::StripOffsets, 600),
            ])
            .build();
        let summary = fetch_file_info(&bytes).unwrap();
        assert_eq!(summary.file_type, FileType::Tiff);
        assert_eq!((summary.width, summary.height), (40, 30));
        assert_eq!(summary.bits_per_pixel, 16);
    }

    #[test]
    fn test_fetch_tiff_errors_propagate() {
        let bytes = TiffBuilder::little_endian()
            .ifd(vec![Entry::short(TiffTag::Compression, 5)])
            .build();
        assert!(matches!(
            fetch_file_info(&bytes),
            Err(FormatError::CompressedData(5))
        ));
    }

    #[test]
    fn test_fetch_undecodable_format_is_bare() {
        let mut pdf = b"%PDF-1.7\n".to_vec();
        pdf.resize(200, 0);
        let summary = fetch_file_info(&pdf).unwrap();
        assert_eq!(summary.file_type, FileType::Pdf);
        assert_eq!(summary.mime_type, "application/pdf");
        assert_eq!((summary.width, summary.height, summary.bits_per_pixel), (0, 0, 0));
    }

    #[test]
    fn test_fetch_corrupt_png_keeps_classification() {
        let mut buf = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        buf.resize(200, 0xAA);
        let summary = fetch_file_info(&buf).unwrap();
        assert_eq!(summary.file_type, FileType::Png);
        assert_eq!((summary.width, summary.height), (0, 0));
    }

    #[test]
    fn test_fetch_unknown() {
        let summary = fetch_file_info(&[0u8; 200]).unwrap();
        assert_eq!(summary.file_type, FileType::Unknown);
        assert_eq!(summary.mime_type, "application/octet-stream");
    }
}

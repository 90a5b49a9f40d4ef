//! Codec-backed image conversion.
//!
//! This is the delegation boundary to the external codec: input bytes are
//! decoded, resampled according to the resolved target geometry, and encoded
//! to the requested MIME type. Nothing format-internal happens here; the
//! codec owns all of JPEG/PNG/GIF.
//!
//! Only inputs the codec layer is wired for (JPEG and PNG, as reported by
//! [`crate::detect::is_supported_image`]) are accepted. TIFF goes through the
//! native decoder instead, and documents like PDF are rejected outright.

use std::io::Cursor;

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use tracing::debug;

use crate::detect::{classify, FileType};
use crate::error::ConvertError;

use super::command::{CompressionQuality, ConversionCommand, SpeedHint};

// =============================================================================
// Quality and filter mapping
// =============================================================================

/// Map the normalized 0-100 quality to the encoder's 1-100 scale.
///
/// 0 (lossless intent) and 1 (best lossy) both select the maximum; 100
/// (worst) bottoms out at 20 rather than 1, and everything in between is a
/// linear ramp between those endpoints.
pub(crate) fn jpeg_quality(normalized: u8) -> u8 {
    match normalized {
        0 | 1 => 100,
        100 => 20,
        q => 100 - (q as u32 * 80 / 100) as u8,
    }
}

/// Map the resize speed hint to a resampling filter.
pub(crate) fn resize_filter(hint: SpeedHint) -> FilterType {
    match hint {
        SpeedHint::UltraQuality => FilterType::Lanczos3,
        SpeedHint::Quality => FilterType::CatmullRom,
        SpeedHint::Balanced => FilterType::Triangle,
        SpeedHint::Speed => FilterType::Nearest,
    }
}

fn input_format(file_type: FileType) -> Result<ImageFormat, ConvertError> {
    match file_type {
        FileType::Jpeg => Ok(ImageFormat::Jpeg),
        FileType::Png => Ok(ImageFormat::Png),
        other => Err(ConvertError::UnsupportedInput(
            other.mime_type().to_string(),
        )),
    }
}

// =============================================================================
// Conversion
// =============================================================================

/// Convert an in-memory image according to a [`ConversionCommand`].
///
/// The input is classified first; anything the codec layer cannot decode is
/// rejected with [`ConvertError::UnsupportedInput`]. The target geometry is
/// resolved by the command; a "no resize" sentinel or an identical dimension
/// skips the resample step entirely.
pub fn convert_image(input: &[u8], command: &ConversionCommand) -> Result<Bytes, ConvertError> {
    let format = input_format(classify(input))?;
    let img = image::load_from_memory_with_format(input, format)
        .map_err(|e| ConvertError::Decode(e.to_string()))?;

    let (source_w, source_h) = (img.width(), img.height());
    let img = match command.target_dimension(source_w, source_h) {
        Some(target) if (target.width, target.height) != (source_w, source_h) => {
            debug!(
                source_width = source_w,
                source_height = source_h,
                target_width = target.width,
                target_height = target.height,
                "resizing image"
            );
            img.resize_exact(target.width, target.height, resize_filter(command.speed_hint))
        }
        _ => img,
    };

    encode(&img, command)
}

/// Create a thumbnail bounded by `width` x `height`, preserving aspect ratio.
pub fn create_thumbnail(
    input: &[u8],
    format: impl Into<String>,
    width: u32,
    height: u32,
    quality: CompressionQuality,
    speed_hint: SpeedHint,
) -> Result<Bytes, ConvertError> {
    let command = ConversionCommand::new(format)
        .with_dimension(width, height)
        .with_compression_quality(quality)
        .with_speed_hint(speed_hint);
    convert_image(input, &command)
}

fn encode(img: &DynamicImage, command: &ConversionCommand) -> Result<Bytes, ConvertError> {
    let mut out = Vec::new();
    match command.output_format.as_str() {
        "image/jpeg" => {
            let encoder = JpegEncoder::new_with_quality(&mut out, jpeg_quality(command.quality));
            img.write_with_encoder(encoder)
                .map_err(|e| ConvertError::Encode(e.to_string()))?;
        }
        "image/png" => {
            img.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
                .map_err(|e| ConvertError::Encode(e.to_string()))?;
        }
        "image/gif" => {
            img.write_to(&mut Cursor::new(&mut out), ImageFormat::Gif)
                .map_err(|e| ConvertError::Encode(e.to_string()))?;
        }
        other => return Err(ConvertError::UnsupportedTarget(other.to_string())),
    }
    Ok(Bytes::from(out))
}

// =============================================================================
// Tests
// =============================================================================

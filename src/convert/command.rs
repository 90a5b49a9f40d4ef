//! Conversion command and target geometry resolution.
//!
//! A [`ConversionCommand`] describes one image conversion: output format,
//! quality, an optional bounding box or explicit scale factor, and a
//! speed/quality hint for the resize step. The geometry resolution rules
//! live here too, because every conversion path funnels through them.

// =============================================================================
// Dimension
// =============================================================================

/// A width/height pair in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimension {
    pub width: u32,
    pub height: u32,
}

impl Dimension {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

// =============================================================================
// Quality and speed hints
// =============================================================================

/// Compression quality in four predefined steps.
///
/// Note that for inherently lossy formats like JPEG even `Lossless` produces
/// lossy output (maximum-quality lossy); true lossless output needs a format
/// like PNG.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionQuality {
    /// Maximum quality (still lossy for JPEG output)
    Lossless,
    /// High quality lossy compression
    LossyBest,
    /// Balanced quality/size
    #[default]
    LossyMedium,
    /// Smallest files, fastest encoding
    LossySpeed,
}

impl CompressionQuality {
    /// Normalized quality value: 0 = lossless intent, 1 = best lossy,
    /// 100 = worst lossy.
    pub const fn normalized(self) -> u8 {
        match self {
            CompressionQuality::Lossless => 0,
            CompressionQuality::LossyBest => 1,
            CompressionQuality::LossyMedium => 50,
            CompressionQuality::LossySpeed => 100,
        }
    }
}

/// Speed/quality trade-off for the resize step, fastest to highest quality.
///
/// Consumed only when an image is actually resampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpeedHint {
    /// Fastest resampling, lowest quality
    #[default]
    Speed,
    /// Balanced
    Balanced,
    /// High quality
    Quality,
    /// Highest quality, slowest
    UltraQuality,
}

// =============================================================================
// ConversionCommand
// =============================================================================

/// Definition of one image conversion.
///
/// The target geometry is resolved by [`ConversionCommand::target_dimension`]
/// from the source dimensions; all other fields pass straight through to the
/// encoder boundary.
#[derive(Debug, Clone)]
pub struct ConversionCommand {
    /// Output format as a MIME type (e.g. `image/jpeg`, `image/png`)
    pub output_format: String,
    /// Normalized quality: 0 = lossless intent, 1 = best lossy, 100 = worst
    pub quality: u8,
    /// Optional bounding box (width and height limits)
    pub dimension: Option<Dimension>,
    /// Whether the bounding box preserves the source aspect ratio
    pub keep_aspect_ratio: bool,
    /// Optional explicit scale factor; 1.0 means "no resize"
    pub scale: Option<f32>,
    /// Resampling trade-off, consumed only by the resize step
    pub speed_hint: SpeedHint,
}

impl ConversionCommand {
    /// New command targeting the given MIME type, with no size constraint,
    /// lossless-intent quality and aspect ratio preserved.
    pub fn new(output_format: impl Into<String>) -> Self {
        Self {
            output_format: output_format.into(),
            quality: 0,
            dimension: None,
            keep_aspect_ratio: true,
            scale: None,
            speed_hint: SpeedHint::default(),
        }
    }

    /// Set the normalized quality value.
    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    /// Set the quality from a predefined compression level.
    pub fn with_compression_quality(mut self, quality: CompressionQuality) -> Self {
        self.quality = quality.normalized();
        self
    }

    /// Set the bounding box.
    pub fn with_dimension(mut self, width: u32, height: u32) -> Self {
        self.dimension = Some(Dimension::new(width, height));
        self
    }

    /// Set the explicit scale factor (1.0 = keep).
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = Some(scale);
        self
    }

    /// Disable aspect ratio preservation: the bounding box is taken verbatim.
    pub fn ignoring_aspect_ratio(mut self) -> Self {
        self.keep_aspect_ratio = false;
        self
    }

    /// Set the resize speed/quality hint.
    pub fn with_speed_hint(mut self, hint: SpeedHint) -> Self {
        self.speed_hint = hint;
        self
    }

    /// Resolve the target dimension for a source image.
    ///
    /// Returns `None` when no resize is needed at all (explicit scale factor
    /// of exactly 1.0). Callers must treat that sentinel distinctly from a
    /// computed dimension that happens to equal the source.
    ///
    /// Resolution order:
    /// 1. An explicit scale factor other than 1.0 multiplies both axes,
    ///    independent of the aspect flag and any box.
    /// 2. No bounding box: the source dimensions come back unchanged.
    /// 3. Box with `keep_aspect_ratio == false`: the box verbatim (may
    ///    distort).
    /// 4. Box with aspect preserved: both axes scaled by
    ///    `min(box_w/src_w, box_h/src_h)`, so the result fits the box on
    ///    both axes. A box larger than the source upscales; callers that
    ///    must never enlarge have to check beforehand.
    ///
    /// All products are truncated toward zero, not rounded.
    pub fn target_dimension(&self, source_width: u32, source_height: u32) -> Option<Dimension> {
        if let Some(scale) = self.scale {
            if scale == 1.0 {
                return None;
            }
            return Some(Dimension::new(
                (source_width as f32 * scale) as u32,
                (source_height as f32 * scale) as u32,
            ));
        }

        let limit = match self.dimension {
            Some(d) => d,
            None => return Some(Dimension::new(source_width, source_height)),
        };

        if !self.keep_aspect_ratio {
            return Some(limit);
        }

        let dw = limit.width as f32 / source_width as f32;
        let dh = limit.height as f32 / source_height as f32;
        let scale = dw.min(dh);

        Some(Dimension::new(
            (source_width as f32 * scale) as u32,
            (source_height as f32 * scale) as u32,
        ))
    }
}

// =============================================================================
// Tests
// =============================================================================

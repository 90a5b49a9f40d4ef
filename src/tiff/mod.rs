//! Native decoding of uncompressed TIFF streams.
//!
//! Split into three layers:
//! - [`tags`]: the tag/field-type vocabulary
//! - [`decoder`]: IFD chain walking, producing [`RasterInfo`] records
//! - [`reader`]: raw pixel extraction driven by a decoded [`RasterInfo`]

pub mod decoder;
pub mod reader;
pub mod tags;

pub use decoder::{
    decode_single, decode_tiff, CalibrationFunction, ColorLut, PixelFormat, RasterInfo,
    TiffDecoder,
};
pub use reader::PixelReader;

// =============================================================================
// Test Fixtures
// =============================================================================

//! Imaging primitives for conversion pipelines: magic-number file type
//! detection, uncompressed TIFF decoding, raw pixel extraction, and an ARGB
//! pixel processor, plus a codec-delegating converter for JPEG/PNG input.
//!
//! # Architecture
//!
//! ```text
//! bytes ──> detect (classify) ──┬──> convert (geometry + codec)  JPEG/PNG
//!                               ├──> info (summary probe)
//!                               └──> tiff::decoder ──> tiff::reader ──> pixels
//! ```
//!
//! - [`detect`]: pure magic-number classification; never fails.
//! - [`convert`]: conversion commands, target geometry resolution, and
//!   encode/resize delegation to the external codec.
//! - [`info`]: "what is this file" probe combining the layers above.
//! - [`tiff`]: native IFD decoding and raw pixel reading for uncompressed
//!   TIFF; the only format decoded in-crate.
//! - [`pixels`]: storage buffers and the ROI-scoped ARGB processor.
//!
//! Everything is synchronous blocking I/O on caller-owned streams; no
//! component holds shared mutable state, so independent calls are safe from
//! independent threads.

pub mod convert;
pub mod detect;
pub mod error;
pub mod info;
pub mod pixels;
pub mod tiff;

pub use convert::{
    convert_image, create_thumbnail, CompressionQuality, ConversionCommand, Dimension, SpeedHint,
};
pub use detect::{classify, is_supported_image, FileType};
pub use error::{ConvertError, FormatError};
pub use info::{fetch_file_info, FileSummary};
pub use pixels::{BufferKind, PixelBuffer, PixelProcessor};
pub use tiff::{decode_single, decode_tiff, PixelFormat, PixelReader, RasterInfo};

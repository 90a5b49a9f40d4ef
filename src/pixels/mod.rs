//! Pixel buffers and the ARGB pixel processor.

pub mod buffer;
pub mod processor;

pub use buffer::{BufferKind, PixelBuffer};
pub use processor::{PixelProcessor, Roi};

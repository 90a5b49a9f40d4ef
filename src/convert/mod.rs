//! Image conversion: command definition, geometry resolution and codec
//! delegation.

pub mod command;
pub mod scaler;

pub use command::{CompressionQuality, ConversionCommand, Dimension, SpeedHint};
pub use scaler::{convert_image, create_thumbnail};

use thiserror::Error;

/// Errors raised while sniffing, decoding or validating image file structure.
///
/// Format problems are always surfaced as a distinct variant so callers can
/// tell "this file is not something we support" apart from a plain I/O
/// failure. I/O errors are propagated as-is; nothing is retried.
#[derive(Debug, Error)]
pub enum FormatError {
    /// I/O error while reading the underlying stream
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TIFF byte order marker is neither 0x4949 (II) nor 0x4D4D (MM)
    #[error("invalid TIFF byte order marker: expected 0x4949 (II) or 0x4D4D (MM), got 0x{0:04X}")]
    InvalidByteOrder(u16),

    /// The directory chain yielded no decodable image directories
    #[error("no image file directories could be decoded")]
    NoDirectories,

    /// An image file directory declared fewer than one entry
    #[error("image file directory with no entries")]
    EmptyDirectory,

    /// BitsPerSample value that does not map to a supported pixel format
    #[error("unsupported BitsPerSample: {0}")]
    UnsupportedBitsPerSample(u32),

    /// SamplesPerPixel other than 1, 3 or 4
    #[error("unsupported SamplesPerPixel: {0}")]
    UnsupportedSamplesPerPixel(u32),

    /// Multi-channel image whose channels are not 8 bits each
    #[error("only 8-bit/channel color images are supported, got {0} bits")]
    UnsupportedRgbBitDepth(u16),

    /// Compression tag with a value other than 1 (none) or 7 (tolerated)
    #[error("cannot open compressed TIFF data (compression = {0})")]
    CompressedData(u32),

    /// A multi-page file was given to a single-page entry point
    #[error("multi-page TIFF is not supported here ({0} pages)")]
    MultiPageUnsupported(usize),

    /// The pixel stream ended before the declared image was complete
    #[error("truncated image data: {eof_errors} end-of-stream condition(s) while reading pixels")]
    TruncatedImage { eof_errors: u32 },

    /// A pixel format the requested operation cannot consume
    #[error("unsupported pixel format for this operation: {0}")]
    UnsupportedPixelFormat(&'static str),
}

/// Errors raised while converting an image through the external codec.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The input bytes are not a format the codec layer can decode
    #[error("unsupported input format: {0}")]
    UnsupportedInput(String),

    /// The requested output MIME type has no wired encoder
    #[error("unsupported target format: {0}")]
    UnsupportedTarget(String),

    /// Decode failure inside the external codec
    #[error("decode error: {0}")]
    Decode(String),

    /// Encode failure inside the external codec
    #[error("encode error: {0}")]
    Encode(String),

    /// Structural problem detected before the codec was invoked
    #[error(transparent)]
    Format(#[from] FormatError),
}

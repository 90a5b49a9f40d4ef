//! Tagged union over the pixel storage kinds the reader can produce.

// =============================================================================
// BufferKind
// =============================================================================

/// Storage kind of a [`PixelBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferKind {
    /// 8-bit samples (grayscale, indexed color, expanded bitmap)
    Bytes,
    /// 16-bit samples (signed data stored biased)
    Shorts,
    /// 32-bit samples widened to float
    Floats,
    /// Packed 32-bit ARGB pixels
    Argb,
}

// =============================================================================
// PixelBuffer
// =============================================================================

/// A decoded raw pixel buffer.
///
/// Only the ARGB kind is promoted to a full [`crate::pixels::PixelProcessor`];
/// the other kinds are plain storage handed to downstream consumers.
#[derive(Debug, Clone, PartialEq)]
pub enum PixelBuffer {
    Bytes(Vec<u8>),
    Shorts(Vec<u16>),
    Floats(Vec<f32>),
    Argb(Vec<u32>),
}

impl PixelBuffer {
    /// Number of pixels (samples) held.
    pub fn len(&self) -> usize {
        match self {
            PixelBuffer::Bytes(v) => v.len(),
            PixelBuffer::Shorts(v) => v.len(),
            PixelBuffer::Floats(v) => v.len(),
            PixelBuffer::Argb(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub const fn kind(&self) -> BufferKind {
        match self {
            PixelBuffer::Bytes(_) => BufferKind::Bytes,
            PixelBuffer::Shorts(_) => BufferKind::Shorts,
            PixelBuffer::Floats(_) => BufferKind::Floats,
            PixelBuffer::Argb(_) => BufferKind::Argb,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            PixelBuffer::Bytes(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_shorts(&self) -> Option<&[u16]> {
        match self {
            PixelBuffer::Shorts(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_floats(&self) -> Option<&[f32]> {
        match self {
            PixelBuffer::Floats(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_argb(&self) -> Option<&[u32]> {
        match self {
            PixelBuffer::Argb(v) => Some(v),
            _ => None,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_len_and_kind() {
        let buf = PixelBuffer::Bytes(vec![1, 2, 3]);
        assert_eq!(buf.len(), 3);
        assert_eq!(buf.kind(), BufferKind::Bytes);

        let buf = PixelBuffer::Argb(vec![0xFF00_0000; 4]);
        assert_eq!(buf.len(), 4);
        assert_eq!(buf.kind(), BufferKind::Argb);
        assert!(!buf.is_empty());
    }

    #[test]
    fn test_accessors() {
        let buf = PixelBuffer::Shorts(vec![32768]);
        assert_eq!(buf.as_shorts(), Some(&[32768u16][..]));
        assert_eq!(buf.as_bytes(), None);
        assert_eq!(buf.as_argb(), None);
    }
}

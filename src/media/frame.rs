//! Stream identifiers and decoded frame types
//!
//! `StreamId` is the join key shared by the admission controller, the
//! snapshot scheduler and the coordinator. `VideoFrame` is what a media
//! connection hands to its frame sink.

use std::sync::Arc;

use bytes::Bytes;

/// Opaque identifier naming a live feed
///
/// Cheap to clone: the string is shared behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StreamId(Arc<str>);

impl StreamId {
    /// Create a new stream id
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    /// Borrow the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StreamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StreamId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for StreamId {
    fn from(id: String) -> Self {
        Self(Arc::from(id))
    }
}

impl AsRef<str> for StreamId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Pixel layout of a decoded frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// Packed 24-bit RGB
    Rgb8,
    /// Packed 32-bit RGBA
    Rgba8,
    /// Packed 32-bit BGRA (common for platform decoders)
    Bgra8,
}

impl PixelFormat {
    /// Bytes per pixel
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelFormat::Rgb8 => 3,
            PixelFormat::Rgba8 | PixelFormat::Bgra8 => 4,
        }
    }
}

/// A decoded video frame
///
/// Cheap to clone due to `Bytes` reference counting.
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Pixel layout of `data`
    pub format: PixelFormat,
    /// Packed pixel data, row-major, no padding
    pub data: Bytes,
    /// Presentation timestamp in milliseconds
    pub timestamp: u32,
}

impl VideoFrame {
    /// Create a frame
    pub fn new(width: u32, height: u32, format: PixelFormat, data: Bytes) -> Self {
        Self {
            width,
            height,
            format,
            data,
            timestamp: 0,
        }
    }

    /// Set the presentation timestamp
    pub fn with_timestamp(mut self, timestamp: u32) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Whether either dimension is zero
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Number of bytes `data` must hold for the declared geometry
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_pixel()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_id_display_and_eq() {
        let a = StreamId::new("studio-4");
        let b: StreamId = "studio-4".into();
        let c: StreamId = String::from("ota-7").into();

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.to_string(), "studio-4");
        assert_eq!(c.as_str(), "ota-7");
    }

    #[test]
    fn test_frame_geometry() {
        let frame = VideoFrame::new(4, 2, PixelFormat::Rgba8, Bytes::from(vec![0u8; 32]));
        assert_eq!(frame.expected_len(), 32);
        assert!(!frame.is_empty());

        let empty = VideoFrame::new(0, 2, PixelFormat::Rgb8, Bytes::new());
        assert!(empty.is_empty());
        assert_eq!(empty.expected_len(), 0);
    }
}

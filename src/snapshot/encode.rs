//! Frame rasterisation and JPEG encoding
//!
//! Draws a decoded frame onto an offscreen RGB surface, scaled down to fit the
//! configured bounds, and encodes it as a JPEG payload.

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, ImageBuffer, Rgb};

use crate::config::SnapshotEncoding;
use crate::error::{Error, Result};
use crate::media::{PixelFormat, VideoFrame};

/// A JPEG image and its dimensions
#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub data: Bytes,
    pub width: u32,
    pub height: u32,
}

/// Encode `frame` as a JPEG, scaled to fit within `encoding`'s bounds
pub fn encode_frame(frame: &VideoFrame, encoding: &SnapshotEncoding) -> Result<EncodedImage> {
    if frame.is_empty() {
        return Err(Error::EmptyFrame {
            width: frame.width,
            height: frame.height,
        });
    }

    let expected = frame.expected_len();
    if frame.data.len() < expected {
        return Err(Error::InvalidFrame(format!(
            "{}x{} {:?} needs {} bytes, got {}",
            frame.width,
            frame.height,
            frame.format,
            expected,
            frame.data.len()
        )));
    }

    let surface = to_rgb_surface(frame, expected)?;
    let surface = fit_within(surface, encoding.max_width, encoding.max_height);
    let (width, height) = surface.dimensions();

    let mut jpeg = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut jpeg, encoding.quality.clamp(1, 100));
    encoder
        .encode(surface.as_raw(), width, height, ExtendedColorType::Rgb8)
        .map_err(|e| Error::Encode(e.to_string()))?;

    Ok(EncodedImage {
        data: Bytes::from(jpeg),
        width,
        height,
    })
}

fn to_rgb_surface(frame: &VideoFrame, len: usize) -> Result<ImageBuffer<Rgb<u8>, Vec<u8>>> {
    let pixels = &frame.data[..len];

    let rgb: Vec<u8> = match frame.format {
        PixelFormat::Rgb8 => pixels.to_vec(),
        PixelFormat::Rgba8 => pixels
            .chunks_exact(4)
            .flat_map(|p| [p[0], p[1], p[2]])
            .collect(),
        PixelFormat::Bgra8 => pixels
            .chunks_exact(4)
            .flat_map(|p| [p[2], p[1], p[0]])
            .collect(),
    };

    ImageBuffer::from_raw(frame.width, frame.height, rgb)
        .ok_or_else(|| Error::InvalidFrame("failed to create RGB surface".into()))
}

/// Scale down preserving aspect ratio; never scales up
fn fit_within(
    surface: ImageBuffer<Rgb<u8>, Vec<u8>>,
    max_width: u32,
    max_height: u32,
) -> ImageBuffer<Rgb<u8>, Vec<u8>> {
    let (width, height) = surface.dimensions();
    if max_width == 0 || max_height == 0 || (width <= max_width && height <= max_height) {
        return surface;
    }

    DynamicImage::ImageRgb8(surface)
        .resize(max_width, max_height, FilterType::Triangle)
        .to_rgb8()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::testing::rgb_frame;

    const JPEG_SOI: [u8; 2] = [0xFF, 0xD8];

    #[test]
    fn test_encode_small_frame() {
        let image = encode_frame(&rgb_frame(4, 4), &SnapshotEncoding::default()).unwrap();

        assert_eq!((image.width, image.height), (4, 4));
        assert_eq!(&image.data[..2], &JPEG_SOI);
    }

    #[test]
    fn test_encode_scales_down_preserving_aspect() {
        let encoding = SnapshotEncoding {
            max_width: 160,
            max_height: 90,
            quality: 60,
        };
        let image = encode_frame(&rgb_frame(320, 180), &encoding).unwrap();

        assert_eq!((image.width, image.height), (160, 90));

        let decoded = image::load_from_memory(&image.data).unwrap();
        assert_eq!(decoded.width(), 160);
        assert_eq!(decoded.height(), 90);
    }

    #[test]
    fn test_encode_bgra() {
        let data = Bytes::from(vec![0x10, 0x20, 0x30, 0xFF].repeat(4));
        let frame = VideoFrame::new(2, 2, PixelFormat::Bgra8, data);

        let image = encode_frame(&frame, &SnapshotEncoding::default()).unwrap();
        assert_eq!((image.width, image.height), (2, 2));
    }

    #[test]
    fn test_empty_frame_rejected() {
        let frame = VideoFrame::new(0, 0, PixelFormat::Rgb8, Bytes::new());

        let err = encode_frame(&frame, &SnapshotEncoding::default()).unwrap_err();
        assert_eq!(
            err,
            Error::EmptyFrame {
                width: 0,
                height: 0
            }
        );
    }

    #[test]
    fn test_short_buffer_rejected() {
        let frame = VideoFrame::new(4, 4, PixelFormat::Rgba8, Bytes::from(vec![0u8; 10]));

        let err = encode_frame(&frame, &SnapshotEncoding::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidFrame(_)));
    }
}

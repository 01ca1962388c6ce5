//! Frame type representing one captured still with metadata.

use super::CameraPosition;
use image::{DynamicImage, ImageFormat, RgbaImage};
use std::io::Cursor;
use std::sync::Arc;
use std::time::Instant;

/// A single still delivered by a device's capture completion.
///
/// Holds the encoded image data exactly as the device produced it along
/// with the metadata needed to pair front and back captures. The data is
/// shared, so clones are cheap.
#[derive(Clone)]
pub struct Frame {
    /// Encoded image data (PNG, JPEG, ...).
    data: Arc<[u8]>,
    /// Image width in pixels.
    width: u32,
    /// Image height in pixels.
    height: u32,
    /// Sensor that produced the still.
    position: CameraPosition,
    /// Capture timestamp.
    timestamp: Instant,
    /// Per-device monotonic sequence number.
    sequence: u64,
}

impl Frame {
    /// Creates a new frame from already-encoded image data.
    pub fn new(
        data: Vec<u8>,
        width: u32,
        height: u32,
        position: CameraPosition,
        sequence: u64,
    ) -> Self {
        Self {
            data: Arc::from(data),
            width,
            height,
            position,
            timestamp: Instant::now(),
            sequence,
        }
    }

    /// Encodes `image` as PNG and wraps it in a frame.
    pub fn from_image(
        image: &RgbaImage,
        position: CameraPosition,
        sequence: u64,
    ) -> Result<Self, image::ImageError> {
        let mut data = Vec::new();
        image.write_to(&mut Cursor::new(&mut data), ImageFormat::Png)?;
        Ok(Self::new(
            data,
            image.width(),
            image.height(),
            position,
            sequence,
        ))
    }

    /// Returns the encoded image data.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    /// Camera that produced the still.
    pub fn position(&self) -> CameraPosition {
        self.position
    }

    #[inline]
    /// When the still was delivered.
    pub fn timestamp(&self) -> Instant {
        self.timestamp
    }

    #[inline]
    /// Per-device capture counter.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Checks that the frame carries data and non-zero dimensions.
    pub fn is_valid(&self) -> bool {
        !self.data.is_empty() && self.width > 0 && self.height > 0
    }

    /// Decodes the still to RGBA.
    ///
    /// Returns `None` when the data cannot be decoded.
    pub fn decode(&self) -> Option<RgbaImage> {
        match image::load_from_memory(&self.data) {
            Ok(image) => Some(DynamicImage::into_rgba8(image)),
            Err(e) => {
                tracing::debug!(
                    position = %self.position,
                    sequence = self.sequence,
                    error = %e,
                    "Failed to decode frame"
                );
                None
            }
        }
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("position", &self.position)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("sequence", &self.sequence)
            .field("encoded_bytes", &self.data.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_from_image_decodes() {
        let image = RgbaImage::from_pixel(4, 3, image::Rgba([10, 20, 30, 255]));
        let frame = Frame::from_image(&image, CameraPosition::Front, 1).unwrap();

        assert_eq!(frame.width(), 4);
        assert_eq!(frame.height(), 3);
        assert_eq!(frame.sequence(), 1);
        assert!(frame.is_valid());
        assert_eq!(frame.decode().unwrap(), image);
    }

    #[test]
    fn test_frame_undecodable() {
        let frame = Frame::new(vec![0u8; 100], 640, 480, CameraPosition::Back, 1);

        assert!(frame.is_valid());
        assert!(frame.decode().is_none());
    }

    #[test]
    fn test_frame_empty_invalid() {
        let frame = Frame::new(Vec::new(), 640, 480, CameraPosition::Back, 1);
        assert!(!frame.is_valid());
    }
}

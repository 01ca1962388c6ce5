//! Inset rectangle geometry.
//!
//! All geometry is computed in the background image's own pixel space, so
//! the layout does not depend on any display resolution.

use super::PipPosition;
use crate::capture::CompositeConfig;

/// Inset placement in background pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InsetRect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
}

/// Integer pixel rectangle, possibly extending past the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    /// Left edge, may be negative.
    pub x: i64,
    /// Top edge, may be negative.
    pub y: i64,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl InsetRect {
    /// Lays out the inset for a `canvas` sized background and a `front`
    /// sized inset source anchored at `position`.
    ///
    /// Width is a fixed fraction of the canvas width; height follows the
    /// front image's aspect ratio.
    pub fn layout(
        canvas: (u32, u32),
        front: (u32, u32),
        position: PipPosition,
        config: &CompositeConfig,
    ) -> Self {
        let (canvas_w, canvas_h) = (canvas.0 as f64, canvas.1 as f64);
        let width = canvas_w * config.inset_width_ratio;
        let height = width * (front.1 as f64 / front.0 as f64);

        let x = if position.is_left() {
            config.padding
        } else {
            canvas_w - config.padding - width
        };
        let y = if position.is_top() {
            config.padding
        } else {
            canvas_h - config.padding - height
        };

        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Width divided by height.
    pub fn aspect_ratio(&self) -> f64 {
        self.width / self.height
    }

    /// Rounds to whole pixels. Never collapses below one pixel.
    pub fn to_pixels(&self) -> PixelRect {
        PixelRect {
            x: self.x.round() as i64,
            y: self.y.round() as i64,
            width: self.width.round().max(1.0) as u32,
            height: self.height.round().max(1.0) as u32,
        }
    }
}

impl PixelRect {
    /// Grows the rectangle by `amount` pixels on every side.
    pub fn expand(&self, amount: u32) -> Self {
        Self {
            x: self.x - amount as i64,
            y: self.y - amount as i64,
            width: self.width + 2 * amount,
            height: self.height + 2 * amount,
        }
    }

    /// Part of the rectangle inside a `canvas` sized image, if any.
    pub fn clip(&self, canvas: (u32, u32)) -> Option<Self> {
        let x0 = self.x.max(0);
        let y0 = self.y.max(0);
        let x1 = (self.x + self.width as i64).min(canvas.0 as i64);
        let y1 = (self.y + self.height as i64).min(canvas.1 as i64);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(Self {
            x: x0,
            y: y0,
            width: (x1 - x0) as u32,
            height: (y1 - y0) as u32,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout_top_left() {
        let rect = InsetRect::layout(
            (1000, 1500),
            (300, 400),
            PipPosition::TopLeft,
            &CompositeConfig::default(),
        );

        assert_eq!(rect.x, 16.0);
        assert_eq!(rect.y, 16.0);
        assert!((rect.width - 280.0).abs() < 1e-9);
        assert!((rect.height - 280.0 * 4.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_bottom_right_anchoring() {
        let rect = InsetRect::layout(
            (1000, 1500),
            (400, 300),
            PipPosition::BottomRight,
            &CompositeConfig::default(),
        );

        assert!((1000.0 - (rect.x + rect.width) - 16.0).abs() < 1e-9);
        assert!((1500.0 - (rect.y + rect.height) - 16.0).abs() < 1e-9);
    }

    #[test]
    fn test_pixel_rect_expand() {
        let rect = PixelRect {
            x: 16,
            y: 16,
            width: 280,
            height: 210,
        };
        assert_eq!(
            rect.expand(3),
            PixelRect {
                x: 13,
                y: 13,
                width: 286,
                height: 216,
            }
        );
    }

    #[test]
    fn test_pixel_rect_clip() {
        let tall = PixelRect {
            x: 16,
            y: 16,
            width: 28,
            height: 56_000,
        };
        assert_eq!(
            tall.clip((100, 100)),
            Some(PixelRect {
                x: 16,
                y: 16,
                width: 28,
                height: 84,
            })
        );

        let inside = PixelRect {
            x: 0,
            y: 0,
            width: 10,
            height: 10,
        };
        assert_eq!(inside.clip((10, 10)), Some(inside));
        assert_eq!(tall.expand(20).clip((100, 100)).map(|r| (r.x, r.y)), Some((0, 0)));

        let outside = PixelRect {
            x: 120,
            y: 0,
            width: 10,
            height: 10,
        };
        assert!(outside.clip((100, 100)).is_none());
    }
}

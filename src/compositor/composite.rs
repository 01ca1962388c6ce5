//! Background + mirrored inset compositing.

use super::geometry::{InsetRect, PixelRect};
use super::PipPosition;
use crate::capture::{CompositeConfig, Frame};
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

/// Builds composites of a back still with a front still inset.
///
/// Pure: no state beyond the layout configuration, no side effects.
#[derive(Debug, Clone, Default)]
pub struct Compositor {
    config: CompositeConfig,
}

impl Compositor {
    /// Compositor with the given layout.
    pub fn new(config: CompositeConfig) -> Self {
        Self { config }
    }

    /// Layout and colours in use.
    pub fn config(&self) -> &CompositeConfig {
        &self.config
    }

    /// Inset placement for the given image sizes.
    pub fn layout(&self, canvas: (u32, u32), front: (u32, u32), position: PipPosition) -> InsetRect {
        InsetRect::layout(canvas, front, position, &self.config)
    }

    /// Decodes both stills and composites them.
    ///
    /// Returns `None` if either still cannot be decoded; the caller still
    /// holds the raw frames.
    pub fn composite(&self, back: &Frame, front: &Frame, position: PipPosition) -> Option<RgbaImage> {
        let back = back.decode()?;
        let front = front.decode()?;
        self.composite_images(&back, &front, position)
    }

    /// Composites decoded images.
    ///
    /// The canvas is the back image at its own size, never resampled. The
    /// front image is scaled into the inset box and mirrored horizontally
    /// exactly once.
    pub fn composite_images(
        &self,
        back: &RgbaImage,
        front: &RgbaImage,
        position: PipPosition,
    ) -> Option<RgbaImage> {
        if back.width() == 0 || back.height() == 0 || front.width() == 0 || front.height() == 0 {
            tracing::debug!("Cannot composite empty image");
            return None;
        }

        let mut canvas = back.clone();
        let rect = self.layout(canvas.dimensions(), front.dimensions(), position).to_pixels();

        match rect.clip(canvas.dimensions()) {
            Some(visible) if visible == rect => {
                let scaled = if front.dimensions() == (rect.width, rect.height) {
                    front.clone()
                } else {
                    imageops::resize(front, rect.width, rect.height, FilterType::Triangle)
                };
                let mirrored = imageops::flip_horizontal(&scaled);
                self.draw_inset(&mut canvas, &mirrored, rect);
            }
            Some(visible) => {
                let mirrored = visible_inset(front, rect, visible);
                self.draw_border(&mut canvas, rect);
                imageops::replace(&mut canvas, &mirrored, visible.x, visible.y);
            }
            None => self.draw_border(&mut canvas, rect),
        }

        tracing::debug!(
            position = %position,
            canvas_width = canvas.width(),
            canvas_height = canvas.height(),
            inset_x = rect.x,
            inset_y = rect.y,
            inset_width = rect.width,
            inset_height = rect.height,
            "Composited dual capture"
        );
        Some(canvas)
    }

    /// Draws the two-tone frame and copies `inset` (already sized and
    /// oriented) into `rect`.
    fn draw_inset(&self, canvas: &mut RgbaImage, inset: &RgbaImage, rect: PixelRect) {
        self.draw_border(canvas, rect);
        imageops::replace(canvas, inset, rect.x, rect.y);
    }

    fn draw_border(&self, canvas: &mut RgbaImage, rect: PixelRect) {
        fill_rect(
            canvas,
            rect.expand(self.config.outer_border),
            Rgba(self.config.border_background),
        );
        fill_rect(
            canvas,
            rect.expand(self.config.inner_border),
            Rgba(self.config.border_foreground),
        );
    }
}

/// Scales and mirrors only the part of `front` that lands in `visible`.
///
/// Used when the inset box runs past the canvas, so an extreme aspect
/// ratio never allocates the whole box.
fn visible_inset(front: &RgbaImage, rect: PixelRect, visible: PixelRect) -> RgbaImage {
    let scale_x = front.width() as f64 / rect.width as f64;
    let scale_y = front.height() as f64 / rect.height as f64;

    // Mirrored column c shows scaled column (rect.width - 1 - c)
    let offset_x = (visible.x - rect.x) as u32;
    let offset_y = (visible.y - rect.y) as u32;
    let scaled_x = rect.width - offset_x - visible.width;

    let (src_x, src_w) = source_span(scaled_x, visible.width, scale_x, front.width());
    let (src_y, src_h) = source_span(offset_y, visible.height, scale_y, front.height());

    let crop = imageops::crop_imm(front, src_x, src_y, src_w, src_h).to_image();
    let scaled = imageops::resize(&crop, visible.width, visible.height, FilterType::Triangle);
    imageops::flip_horizontal(&scaled)
}

/// Source pixels covering `len` scaled pixels from `start`. `limit` > 0.
fn source_span(start: u32, len: u32, scale: f64, limit: u32) -> (u32, u32) {
    let from = ((start as f64 * scale).floor() as u32).min(limit - 1);
    let to = (((start + len) as f64 * scale).ceil() as u32).clamp(from + 1, limit);
    (from, to - from)
}

/// Fills `rect` clipped to the canvas.
fn fill_rect(canvas: &mut RgbaImage, rect: PixelRect, color: Rgba<u8>) {
    let Some(area) = rect.clip(canvas.dimensions()) else {
        return;
    };

    for y in area.y..area.y + area.height as i64 {
        for x in area.x..area.x + area.width as i64 {
            canvas.put_pixel(x as u32, y as u32, color);
        }
    }
}

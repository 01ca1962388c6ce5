//! Simultaneous still capture and compositing.
//!
//! The coordinator fires both captures on the session queue, joins the two
//! completions and composites the pair. It owns the single result record,
//! which is only written once a capture has succeeded on both sides.

use super::join::{CaptureJoin, JoinOutcome};
use super::queue::SessionQueue;
use super::sessions::DualSessions;
use crate::capture::{CameraError, DeviceDiscovery, FlashMode, Frame};
use crate::compositor::{Compositor, PipPosition};
use chrono::{DateTime, Utc};
use image::{ImageFormat, RgbaImage};
use std::io::Cursor;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

/// Front, back and composite images of one capture.
///
/// All fields are set and cleared together. A composite is only ever
/// present alongside both stills; both stills without a composite means
/// compositing failed.
#[derive(Clone, Default)]
pub struct CaptureResult {
    front: Option<Frame>,
    back: Option<Frame>,
    composite: Option<Arc<RgbaImage>>,
    captured_at: Option<DateTime<Utc>>,
}

impl CaptureResult {
    /// Front still of the latest capture.
    pub fn front_image(&self) -> Option<&Frame> {
        self.front.as_ref()
    }

    /// Back still of the latest capture.
    pub fn back_image(&self) -> Option<&Frame> {
        self.back.as_ref()
    }

    /// Composite of the latest capture.
    pub fn composite_image(&self) -> Option<&RgbaImage> {
        self.composite.as_deref()
    }

    /// When the latest capture finished.
    pub fn captured_at(&self) -> Option<DateTime<Utc>> {
        self.captured_at
    }

    /// True when both stills are present.
    pub fn has_pair(&self) -> bool {
        self.front.is_some() && self.back.is_some()
    }

    /// True when nothing is held.
    pub fn is_empty(&self) -> bool {
        self.front.is_none() && self.back.is_none() && self.composite.is_none()
    }

    /// Resets every field.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    fn set(&mut self, front: Frame, back: Frame, composite: Option<RgbaImage>) {
        self.front = Some(front);
        self.back = Some(back);
        self.composite = composite.map(Arc::new);
        self.captured_at = Some(Utc::now());
    }

    /// Packages the composite for the upload collaborator.
    pub fn upload(&self, caption: Option<String>) -> Option<CompositeUpload> {
        Some(CompositeUpload {
            image: Arc::clone(self.composite.as_ref()?),
            caption: caption.filter(|c| !c.trim().is_empty()),
            captured_at: self.captured_at.unwrap_or_else(Utc::now),
        })
    }
}

impl std::fmt::Debug for CaptureResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureResult")
            .field("front", &self.front)
            .field("back", &self.back)
            .field("composite", &self.composite.as_ref().map(|c| c.dimensions()))
            .field("captured_at", &self.captured_at)
            .finish()
    }
}

/// A composite plus caption, handed off for compression and upload.
#[derive(Clone)]
pub struct CompositeUpload {
    /// Composite to upload.
    pub image: Arc<RgbaImage>,
    /// Optional caption; never blank.
    pub caption: Option<String>,
    /// When the pair was captured.
    pub captured_at: DateTime<Utc>,
}

impl CompositeUpload {
    /// Encodes the composite as PNG.
    pub fn encode_png(&self) -> Result<Vec<u8>, image::ImageError> {
        let mut data = Vec::new();
        self.image
            .write_to(&mut Cursor::new(&mut data), ImageFormat::Png)?;
        Ok(data)
    }
}

impl std::fmt::Debug for CompositeUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeUpload")
            .field("dimensions", &self.image.dimensions())
            .field("caption", &self.caption)
            .field("captured_at", &self.captured_at)
            .finish()
    }
}

/// Running totals for metrics.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CaptureStats {
    /// Dual captures attempted.
    pub captures: u64,
    /// Dual captures that failed.
    pub capture_failures: u64,
    /// Composites produced.
    pub composites: u64,
    /// Composites that could not be produced.
    pub composite_failures: u64,
    /// Duration of the latest composite.
    pub last_composite_ms: Option<f64>,
}

/// Triggers dual captures and owns their result.
pub struct CaptureCoordinator {
    compositor: Compositor,
    result: CaptureResult,
    stats: CaptureStats,
}

impl CaptureCoordinator {
    /// Coordinator with an empty result.
    pub fn new(compositor: Compositor) -> Self {
        Self {
            compositor,
            result: CaptureResult::default(),
            stats: CaptureStats::default(),
        }
    }

    /// The held capture.
    pub fn result(&self) -> &CaptureResult {
        &self.result
    }

    /// Running totals.
    pub fn stats(&self) -> CaptureStats {
        self.stats
    }

    /// Drops the held capture.
    pub fn clear(&mut self) {
        self.result.clear();
    }

    /// Captures on both sessions and composites the pair.
    ///
    /// Resolves on the first error or once both sides have succeeded. On
    /// failure the result stays empty and the error is returned; a late
    /// completion from the other side is discarded.
    pub async fn capture<S>(
        &mut self,
        queue: &SessionQueue<DualSessions<S>>,
        flash: FlashMode,
        position: PipPosition,
    ) -> Result<(), CameraError>
    where
        S: DeviceDiscovery + 'static,
    {
        self.result.clear();
        self.stats.captures += 1;

        match Self::join_captures(queue, flash).await {
            JoinOutcome::Captured { front, back } => {
                self.finalize(front, back, position).await;
                Ok(())
            }
            JoinOutcome::Failed(e) => {
                self.stats.capture_failures += 1;
                tracing::warn!(error = %e, "Dual capture failed");
                Err(e)
            }
        }
    }

    async fn join_captures<S>(queue: &SessionQueue<DualSessions<S>>, flash: FlashMode) -> JoinOutcome
    where
        S: DeviceDiscovery + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel();
        if let Err(e) = queue.submit(move |sessions| sessions.trigger_capture(flash, tx)).await {
            return JoinOutcome::Failed(e);
        }

        let mut join = CaptureJoin::new();
        loop {
            match rx.recv().await {
                Some((position, result)) => {
                    if let Some(outcome) = join.record(position, result) {
                        return outcome;
                    }
                }
                // Every completion was dropped without reporting
                None => {
                    return JoinOutcome::Failed(CameraError::CaptureError(
                        "capture completion dropped".into(),
                    ))
                }
            }
        }
    }

    async fn finalize(&mut self, front: Frame, back: Frame, position: PipPosition) {
        let compositor = self.compositor.clone();
        let (front_src, back_src) = (front.clone(), back.clone());
        let started = Instant::now();

        let composite =
            tokio::task::spawn_blocking(move || compositor.composite(&back_src, &front_src, position))
                .await
                .unwrap_or_else(|e| {
                    tracing::error!(error = %e, "Compositing task failed");
                    None
                });

        self.record_composite(composite.is_some(), started);
        self.result.set(front, back, composite);
        tracing::info!(
            pip = %position,
            composited = self.result.composite.is_some(),
            "Dual capture finalized"
        );
    }

    /// Recomposites the held pair at `position` without recapturing.
    ///
    /// Returns whether a composite is now available.
    pub fn recomposite(&mut self, position: PipPosition) -> bool {
        let (Some(front), Some(back)) = (&self.result.front, &self.result.back) else {
            return false;
        };

        let started = Instant::now();
        let composite = self.compositor.composite(back, front, position);
        self.record_composite(composite.is_some(), started);
        self.result.composite = composite.map(Arc::new);
        self.result.composite.is_some()
    }

    fn record_composite(&mut self, succeeded: bool, started: Instant) {
        if succeeded {
            self.stats.composites += 1;
            self.stats.last_composite_ms = Some(started.elapsed().as_secs_f64() * 1000.0);
        } else {
            self.stats.composite_failures += 1;
            tracing::warn!("Compositing failed, raw stills kept");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::CameraPosition;

    fn still(position: CameraPosition, width: u32, height: u32) -> Frame {
        let image = RgbaImage::from_fn(width, height, |x, _| image::Rgba([x as u8, 0, 0, 255]));
        Frame::from_image(&image, position, 1).unwrap()
    }

    #[test]
    fn test_result_set_and_clear() {
        let mut result = CaptureResult::default();
        assert!(result.is_empty());

        result.set(
            still(CameraPosition::Front, 4, 4),
            still(CameraPosition::Back, 8, 8),
            Some(RgbaImage::new(8, 8)),
        );
        assert!(result.has_pair());
        assert!(result.composite_image().is_some());
        assert!(result.captured_at().is_some());

        result.clear();
        assert!(result.is_empty());
        assert!(result.front_image().is_none());
        assert!(result.back_image().is_none());
        assert!(result.composite_image().is_none());
    }

    #[test]
    fn test_upload_requires_composite() {
        let mut result = CaptureResult::default();
        assert!(result.upload(None).is_none());

        result.set(
            still(CameraPosition::Front, 4, 4),
            still(CameraPosition::Back, 8, 8),
            Some(RgbaImage::new(8, 8)),
        );
        let upload = result.upload(Some("  ".into())).unwrap();
        assert!(upload.caption.is_none());
        assert_eq!(upload.image.dimensions(), (8, 8));

        let upload = result.upload(Some("rooftop".into())).unwrap();
        assert_eq!(upload.caption.as_deref(), Some("rooftop"));
        assert!(!upload.encode_png().unwrap().is_empty());
    }

    #[test]
    fn test_recomposite_without_pair() {
        let mut coordinator = CaptureCoordinator::new(Compositor::default());
        assert!(!coordinator.recomposite(PipPosition::BottomLeft));
        assert_eq!(coordinator.stats().composites, 0);
    }

    #[test]
    fn test_recomposite_replaces_composite() {
        let mut coordinator = CaptureCoordinator::new(Compositor::default());
        coordinator.result.set(
            still(CameraPosition::Front, 20, 30),
            still(CameraPosition::Back, 200, 150),
            None,
        );

        assert!(coordinator.recomposite(PipPosition::TopLeft));
        let top_left = coordinator.result().composite_image().unwrap().clone();
        assert!(coordinator.recomposite(PipPosition::BottomRight));
        let bottom_right = coordinator.result().composite_image().unwrap();

        assert_eq!(top_left.dimensions(), (200, 150));
        assert_ne!(&top_left, bottom_right);
        assert_eq!(coordinator.stats().composites, 2);
    }
}

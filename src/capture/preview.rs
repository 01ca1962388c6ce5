//! Live preview hand-off between a running device and the UI.
//!
//! A [`PreviewSink`] is held by the session (and lent to its device while
//! running); any number of [`PreviewSurface`]s observe the latest frame.
//! Surfaces exist from construction on and show nothing until the session
//! runs.

use super::Frame;
use std::sync::Arc;
use tokio::sync::watch;

/// Creates a connected sink/surface pair with no frame.
pub fn channel() -> (PreviewSink, PreviewSurface) {
    let (tx, rx) = watch::channel(None);
    (PreviewSink { tx: Arc::new(tx) }, PreviewSurface { rx })
}

/// Publishing side of a preview stream.
#[derive(Debug, Clone)]
pub struct PreviewSink {
    tx: Arc<watch::Sender<Option<Arc<Frame>>>>,
}

impl PreviewSink {
    /// Replaces the current preview frame.
    pub fn publish(&self, frame: Frame) {
        tracing::trace!(
            position = %frame.position(),
            sequence = frame.sequence(),
            "Preview frame"
        );
        self.tx.send_replace(Some(Arc::new(frame)));
    }

    /// Blanks the preview.
    pub fn clear(&self) {
        self.tx.send_replace(None);
    }

    /// Creates another surface observing this sink.
    pub fn surface(&self) -> PreviewSurface {
        PreviewSurface {
            rx: self.tx.subscribe(),
        }
    }
}

/// Observing side of a preview stream, for embedding in a view.
#[derive(Debug, Clone)]
pub struct PreviewSurface {
    rx: watch::Receiver<Option<Arc<Frame>>>,
}

impl PreviewSurface {
    /// Latest frame, or `None` while the session is not running.
    pub fn latest(&self) -> Option<Arc<Frame>> {
        self.rx.borrow().clone()
    }

    /// Waits until the preview changes.
    ///
    /// Returns `false` once the publishing session is gone.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::CameraPosition;

    #[test]
    fn test_surface_starts_blank() {
        let (_sink, surface) = channel();
        assert!(surface.latest().is_none());
    }

    #[test]
    fn test_publish_and_clear() {
        let (sink, surface) = channel();
        let late = sink.surface();

        sink.publish(Frame::new(vec![1, 2, 3], 1, 1, CameraPosition::Front, 7));
        assert_eq!(surface.latest().unwrap().sequence(), 7);
        assert_eq!(late.latest().unwrap().sequence(), 7);

        sink.clear();
        assert!(surface.latest().is_none());
    }
}

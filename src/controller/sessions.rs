//! Both capture sessions, as owned by the session queue.

use crate::capture::{
    CameraError, CameraPosition, CaptureSession, DeviceDiscovery, FlashMode, Frame,
    PhotoSettings, PreviewSink,
};
use tokio::sync::mpsc::UnboundedSender;

/// Channel capture completions are forwarded into.
pub type CompletionSender = UnboundedSender<(CameraPosition, Result<Frame, CameraError>)>;

/// Outcome of configuring both sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigureReport {
    /// Front outcome.
    pub front: Result<(), CameraError>,
    /// Back outcome.
    pub back: Result<(), CameraError>,
}

impl ConfigureReport {
    /// Both sides failed with `error`.
    pub fn failed(error: CameraError) -> Self {
        Self {
            front: Err(error.clone()),
            back: Err(error),
        }
    }

    /// True when both sides are bound.
    pub fn is_complete(&self) -> bool {
        self.front.is_ok() && self.back.is_ok()
    }

    /// First failure, front before back.
    pub fn first_error(&self) -> Option<&CameraError> {
        self.front.as_ref().err().or(self.back.as_ref().err())
    }
}

/// Readiness of both sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionStatus {
    /// Front session bound.
    pub front_ready: bool,
    /// Back session bound.
    pub back_ready: bool,
    /// Front session streaming.
    pub front_running: bool,
    /// Back session streaming.
    pub back_running: bool,
}

impl SessionStatus {
    /// True while at least one session streams.
    pub fn is_running(&self) -> bool {
        self.front_running || self.back_running
    }
}

/// The platform discovery plus one session per position.
///
/// Lives on the session queue thread for its whole life.
pub struct DualSessions<S: DeviceDiscovery> {
    discovery: S,
    front: CaptureSession<S::Device>,
    back: CaptureSession<S::Device>,
}

impl<S: DeviceDiscovery> DualSessions<S> {
    /// Unbound sessions over `discovery`, previewing into the given sinks.
    pub fn new(discovery: S, front_preview: PreviewSink, back_preview: PreviewSink) -> Self {
        Self {
            discovery,
            front: CaptureSession::new(CameraPosition::Front, front_preview),
            back: CaptureSession::new(CameraPosition::Back, back_preview),
        }
    }

    /// Readiness of both sides.
    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            front_ready: self.front.is_configured(),
            back_ready: self.back.is_configured(),
            front_running: self.front.is_running(),
            back_running: self.back.is_running(),
        }
    }

    /// Configures front then back. Each side binds independently; a failure
    /// on one side leaves the other intact.
    pub fn configure(&mut self, require_multi_cam: bool) -> ConfigureReport {
        let already_bound = self.front.is_configured() && self.back.is_configured();
        if require_multi_cam && !already_bound && !self.discovery.supports_multi_cam() {
            tracing::warn!("Platform cannot stream front and back together");
            return ConfigureReport::failed(CameraError::MultiCamNotSupported);
        }

        let report = ConfigureReport {
            front: self.front.configure(&mut self.discovery),
            back: self.back.configure(&mut self.discovery),
        };

        if report.is_complete() {
            tracing::info!("Both capture sessions configured");
        } else {
            tracing::warn!(
                front = ?report.front,
                back = ?report.back,
                "Capture sessions partially configured"
            );
        }
        report
    }

    /// Starts every bound session.
    pub fn start(&mut self) -> SessionStatus {
        self.front.start();
        self.back.start();
        self.status()
    }

    /// Stops both sessions.
    pub fn stop(&mut self) -> SessionStatus {
        self.front.stop();
        self.back.stop();
        self.status()
    }

    /// Fires both still captures back to back. The front sensor never uses
    /// flash; the back sensor honours `flash`.
    pub fn trigger_capture(&mut self, flash: FlashMode, completions: CompletionSender) {
        let front_tx = completions.clone();
        self.front.capture(
            PhotoSettings::without_flash(),
            Box::new(move |result| {
                let _ = front_tx.send((CameraPosition::Front, result));
            }),
        );

        self.back.capture(
            PhotoSettings { flash },
            Box::new(move |result| {
                let _ = completions.send((CameraPosition::Back, result));
            }),
        );
    }

    #[cfg(test)]
    pub(crate) fn session(&self, position: CameraPosition) -> &CaptureSession<S::Device> {
        match position {
            CameraPosition::Front => &self.front,
            CameraPosition::Back => &self.back,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{preview, MockCamera, MockDiscovery};

    fn sessions(discovery: MockDiscovery) -> DualSessions<MockDiscovery> {
        let (front, _) = preview::channel();
        let (back, _) = preview::channel();
        DualSessions::new(discovery, front, back)
    }

    #[test]
    fn test_configure_both() {
        let mut sessions = sessions(MockDiscovery::pair((8, 8), (16, 16)));

        let report = sessions.configure(true);
        assert!(report.is_complete());
        assert!(sessions.status().front_ready && sessions.status().back_ready);
    }

    #[test]
    fn test_partial_configuration_keeps_working_side() {
        let front = MockCamera::new(CameraPosition::Front, 8, 8);
        let mut sessions = sessions(MockDiscovery::new(Some(front), None));

        let report = sessions.configure(true);
        assert_eq!(report.front, Ok(()));
        assert_eq!(report.back, Err(CameraError::DeviceNotAvailable));
        assert_eq!(report.first_error(), Some(&CameraError::DeviceNotAvailable));

        let status = sessions.start();
        assert!(status.front_running);
        assert!(!status.back_running);
        assert!(status.is_running());
        assert!(sessions.session(CameraPosition::Front).is_running());
    }

    #[test]
    fn test_multi_cam_required() {
        let mut sessions = sessions(MockDiscovery::pair((8, 8), (8, 8)).without_multi_cam());

        let report = sessions.configure(true);
        assert_eq!(report, ConfigureReport::failed(CameraError::MultiCamNotSupported));
        assert!(!sessions.status().front_ready);

        assert!(sessions.configure(false).is_complete());
    }

    #[test]
    fn test_trigger_capture_flash_only_on_back() {
        let front = MockCamera::new(CameraPosition::Front, 8, 8);
        let back = MockCamera::new(CameraPosition::Back, 8, 8);
        let (front_probe, back_probe) = (front.probe(), back.probe());
        let mut sessions = sessions(MockDiscovery::new(Some(front), Some(back)));
        sessions.configure(true);
        sessions.start();

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        sessions.trigger_capture(FlashMode::On, tx);

        assert_eq!(front_probe.last_flash(), Some(FlashMode::Off));
        assert_eq!(back_probe.last_flash(), Some(FlashMode::On));
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_ok());
    }
}

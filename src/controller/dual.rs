//! Front/back session controller exposed to the presentation layer.

use super::coordinator::{CaptureCoordinator, CaptureResult};
use super::queue::{SessionQueue, Ticket};
use super::sessions::{ConfigureReport, DualSessions, SessionStatus};
use crate::auth::{AuthorizationProvider, PermissionGate};
use crate::capture::{
    preview, CameraError, DeviceDiscovery, FileConfig, FlashMode, PreviewSink, PreviewSurface,
};
use crate::compositor::{Compositor, PipPosition};
use crate::metrics::MetricsSnapshot;
use std::sync::Arc;
use tokio::sync::watch;

/// Name of the session queue thread.
const SESSION_QUEUE_NAME: &str = "dual-capture-sessions";

/// User-visible controller state.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ControllerSnapshot {
    /// Camera access granted.
    pub is_authorized: bool,
    /// At least one session is streaming.
    pub is_session_running: bool,
    /// A dual capture is in flight.
    pub is_capturing: bool,
    /// Front session bound to a device.
    pub front_ready: bool,
    /// Back session bound to a device.
    pub back_ready: bool,
    /// Applied to the back camera only.
    pub flash_mode: FlashMode,
    /// Corner of the inset in the composite.
    pub pip_position: PipPosition,
    /// A composite is held.
    pub has_composite: bool,
    /// Most recent error, cleared when its cause is resolved.
    pub error: Option<CameraError>,
}

impl ControllerSnapshot {
    fn apply_status(&mut self, status: SessionStatus) {
        self.front_ready = status.front_ready;
        self.back_ready = status.back_ready;
        self.is_session_running = status.is_running();
    }
}

/// Owns both capture sessions and drives them through one serial queue.
///
/// All device work runs on the queue; user-visible state is published
/// through a watch channel and can be read with [`snapshot`] or observed
/// with [`subscribe`].
///
/// [`snapshot`]: DualSessionController::snapshot
/// [`subscribe`]: DualSessionController::subscribe
pub struct DualSessionController<S, A>
where
    S: DeviceDiscovery + 'static,
{
    gate: PermissionGate<A>,
    queue: SessionQueue<DualSessions<S>>,
    coordinator: CaptureCoordinator,
    front_preview: PreviewSink,
    back_preview: PreviewSink,
    state: Arc<watch::Sender<ControllerSnapshot>>,
    require_multi_cam: bool,
}

impl<S, A> DualSessionController<S, A>
where
    S: DeviceDiscovery + Send + 'static,
    A: AuthorizationProvider,
{
    /// Creates the controller and its session queue. No device is touched
    /// until authorization succeeds.
    pub fn new(discovery: S, authorization: A, config: &FileConfig) -> Result<Self, CameraError> {
        config.validate().map_err(|e| {
            tracing::error!(error = %e, "Rejected capture configuration");
            CameraError::ConfigurationFailed
        })?;

        let (front_preview, _) = preview::channel();
        let (back_preview, _) = preview::channel();

        let sinks = (front_preview.clone(), back_preview.clone());
        let queue = SessionQueue::spawn(SESSION_QUEUE_NAME, move || {
            DualSessions::new(discovery, sinks.0, sinks.1)
        })?;

        let initial = ControllerSnapshot {
            flash_mode: config.capture.default_flash_mode,
            pip_position: config.capture.initial_pip_position,
            ..Default::default()
        };
        let (state, _) = watch::channel(initial);

        Ok(Self {
            gate: PermissionGate::new(authorization),
            queue,
            coordinator: CaptureCoordinator::new(Compositor::new(config.composite.clone())),
            front_preview,
            back_preview,
            state: Arc::new(state),
            require_multi_cam: config.capture.require_multi_cam,
        })
    }

    /// Checks (and if needed requests) camera authorization, then configures
    /// both sessions. Returns whether access is authorized.
    pub async fn check_authorization(&mut self) -> bool {
        match self.gate.check().await {
            Ok(()) => {
                self.state.send_modify(|s| s.is_authorized = true);
                self.configure_sessions().await;
                true
            }
            Err(e) => {
                self.state.send_modify(|s| {
                    s.is_authorized = false;
                    s.error = Some(e);
                });
                false
            }
        }
    }

    /// Configures front then back as one unit of queue work and waits for
    /// both attempts to finish.
    ///
    /// Without authorization no device is touched and both sides report
    /// `NotAuthorized`.
    pub async fn configure_sessions(&mut self) -> ConfigureReport {
        if !self.gate.is_authorized() {
            self.state
                .send_modify(|s| s.error = Some(CameraError::NotAuthorized));
            return ConfigureReport::failed(CameraError::NotAuthorized);
        }

        let require_multi_cam = self.require_multi_cam;
        let submitted = self
            .queue
            .submit(move |sessions| (sessions.configure(require_multi_cam), sessions.status()))
            .await;

        let (report, status) = match submitted {
            Ok(outcome) => outcome,
            Err(e) => (ConfigureReport::failed(e), SessionStatus::default()),
        };

        self.state.send_modify(|s| {
            s.apply_status(status);
            s.error = report.first_error().cloned();
        });
        report
    }

    /// Starts every bound session. Fire-and-forget: the work is queued
    /// immediately and state updates when it runs; await the ticket to wait.
    ///
    /// Without authorization nothing starts and the ticket resolves to
    /// `NotAuthorized`.
    pub fn start_sessions(&self) -> Ticket<SessionStatus> {
        if !self.gate.is_authorized() {
            self.state
                .send_modify(|s| s.error = Some(CameraError::NotAuthorized));
            return Ticket::failed(CameraError::NotAuthorized);
        }

        let state = Arc::clone(&self.state);
        self.queue.submit(move |sessions| {
            let status = sessions.start();
            state.send_modify(|s| s.apply_status(status));
            status
        })
    }

    /// Stops both sessions. Fire-and-forget like [`start_sessions`].
    ///
    /// [`start_sessions`]: DualSessionController::start_sessions
    pub fn stop_sessions(&self) -> Ticket<SessionStatus> {
        let state = Arc::clone(&self.state);
        self.queue.submit(move |sessions| {
            let status = sessions.stop();
            state.send_modify(|s| s.apply_status(status));
            status
        })
    }

    /// Captures on both cameras and composites the pair.
    ///
    /// Resolves on the first side error or once both stills are in. Errors
    /// are also published in the snapshot; on error no composite is
    /// produced.
    pub async fn capture_dual_photo(&mut self) -> Result<(), CameraError> {
        if !self.gate.is_authorized() {
            self.state
                .send_modify(|s| s.error = Some(CameraError::NotAuthorized));
            return Err(CameraError::NotAuthorized);
        }

        self.state.send_modify(|s| {
            s.is_capturing = true;
            s.has_composite = false;
            if matches!(s.error, Some(CameraError::CaptureError(_))) {
                s.error = None;
            }
        });

        let (flash, position) = {
            let current = self.state.borrow();
            (current.flash_mode, current.pip_position)
        };
        tracing::info!(flash = ?flash, pip = %position, "Capturing dual photo");

        let outcome = self.coordinator.capture(&self.queue, flash, position).await;
        let has_composite = self.coordinator.result().composite_image().is_some();

        self.state.send_modify(|s| {
            s.is_capturing = false;
            s.has_composite = has_composite;
            if let Err(e) = &outcome {
                s.error = Some(e.clone());
            }
        });
        outcome
    }

    /// Advances the flash mode. Applied at the next capture.
    pub fn toggle_flash(&mut self) -> FlashMode {
        let mut mode = FlashMode::default();
        self.state.send_modify(|s| {
            s.flash_mode = s.flash_mode.next();
            mode = s.flash_mode;
        });
        tracing::debug!(flash = ?mode, "Flash mode toggled");
        mode
    }

    /// Advances the inset corner and recomposites a held capture in place.
    pub fn toggle_pip_position(&mut self) -> PipPosition {
        let mut position = PipPosition::default();
        self.state.send_modify(|s| {
            s.pip_position = s.pip_position.next();
            position = s.pip_position;
        });

        let has_composite = self.coordinator.recomposite(position);
        self.state.send_modify(|s| s.has_composite = has_composite);
        tracing::debug!(pip = %position, recomposited = has_composite, "PiP position toggled");
        position
    }

    /// Resets the capture result.
    pub fn clear_captures(&mut self) {
        self.coordinator.clear();
        self.state.send_modify(|s| s.has_composite = false);
    }

    /// Live preview of the front camera.
    pub fn front_preview(&self) -> PreviewSurface {
        self.front_preview.surface()
    }

    /// Live preview of the back camera.
    pub fn back_preview(&self) -> PreviewSurface {
        self.back_preview.surface()
    }

    /// Stills and composite of the latest capture.
    pub fn result(&self) -> &CaptureResult {
        self.coordinator.result()
    }

    /// Current user-visible state.
    pub fn snapshot(&self) -> ControllerSnapshot {
        self.state.borrow().clone()
    }

    /// Observes state changes.
    pub fn subscribe(&self) -> watch::Receiver<ControllerSnapshot> {
        self.state.subscribe()
    }

    /// Whether camera access has been granted.
    pub fn is_authorized(&self) -> bool {
        self.state.borrow().is_authorized
    }

    /// Whether at least one session streams.
    pub fn is_session_running(&self) -> bool {
        self.state.borrow().is_session_running
    }

    /// Counters for the metrics registry.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        let stats = self.coordinator.stats();
        MetricsSnapshot {
            is_session_running: self.is_session_running(),
            captures_total: stats.captures,
            capture_failures_total: stats.capture_failures,
            composites_total: stats.composites,
            composite_failures_total: stats.composite_failures,
            last_composite_ms: stats.last_composite_ms,
        }
    }

    /// The authorization provider.
    pub fn authorization(&self) -> &A {
        self.gate.provider()
    }
}

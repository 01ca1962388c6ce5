//! One capture session per sensor position.
//!
//! A session owns at most one bound device together with its input and
//! photo output. Binding happens once; start and stop toggle streaming and
//! may be repeated as the capture screen comes and goes.

use super::{
    CameraDevice, CameraError, CameraPosition, DeviceDiscovery, PhotoCompletion, PhotoSettings,
    PreviewSink, PreviewSurface,
};
use std::ops::{Deref, DerefMut};

/// Open configuration transaction on a device.
///
/// Commits exactly once when dropped, on every exit path.
pub struct ConfigurationGuard<'a, D: CameraDevice> {
    device: &'a mut D,
}

impl<'a, D: CameraDevice> ConfigurationGuard<'a, D> {
    /// Begins a configuration transaction on `device`.
    pub fn begin(device: &'a mut D) -> Self {
        device.begin_configuration();
        Self { device }
    }
}

impl<D: CameraDevice> Deref for ConfigurationGuard<'_, D> {
    type Target = D;

    fn deref(&self) -> &D {
        self.device
    }
}

impl<D: CameraDevice> DerefMut for ConfigurationGuard<'_, D> {
    fn deref_mut(&mut self) -> &mut D {
        self.device
    }
}

impl<D: CameraDevice> Drop for ConfigurationGuard<'_, D> {
    fn drop(&mut self) {
        self.device.commit_configuration();
    }
}

/// Capture session bound to one camera position.
pub struct CaptureSession<D: CameraDevice> {
    position: CameraPosition,
    device: Option<D>,
    running: bool,
    preview: PreviewSink,
}

impl<D: CameraDevice> CaptureSession<D> {
    /// Creates an unbound session publishing previews into `preview`.
    pub fn new(position: CameraPosition, preview: PreviewSink) -> Self {
        Self {
            position,
            device: None,
            running: false,
            preview,
        }
    }

    #[inline]
    /// Camera this session drives.
    pub fn position(&self) -> CameraPosition {
        self.position
    }

    /// Returns true once a device, input and output are bound.
    #[inline]
    pub fn is_configured(&self) -> bool {
        self.device.is_some()
    }

    #[inline]
    /// True while the device streams.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Live preview for this session; blank until running.
    pub fn preview(&self) -> PreviewSurface {
        self.preview.surface()
    }

    /// Binds the default device at this position with one input and one
    /// photo output. A no-op when already bound.
    ///
    /// On failure nothing stays bound, so the call may be retried.
    pub fn configure<S>(&mut self, discovery: &mut S) -> Result<(), CameraError>
    where
        S: DeviceDiscovery<Device = D>,
    {
        if self.device.is_some() {
            tracing::debug!(position = %self.position, "Session already configured");
            return Ok(());
        }

        let mut device = discovery.default_device(self.position).ok_or_else(|| {
            tracing::warn!(position = %self.position, "No camera device at position");
            CameraError::DeviceNotAvailable
        })?;

        {
            let mut transaction = ConfigurationGuard::begin(&mut device);
            transaction.attach_input()?;
            transaction.attach_photo_output()?;
        }

        tracing::info!(
            position = %self.position,
            device = device.name(),
            "Capture session configured"
        );
        self.device = Some(device);
        Ok(())
    }

    /// Starts streaming. A no-op when already running or not configured.
    pub fn start(&mut self) {
        if self.running {
            return;
        }
        let Some(device) = self.device.as_mut() else {
            tracing::debug!(position = %self.position, "Start skipped, session not configured");
            return;
        };
        device.start_running(self.preview.clone());
        self.running = true;
        tracing::info!(position = %self.position, "Capture session started");
    }

    /// Stops streaming and blanks the preview. A no-op when not running.
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        if let Some(device) = self.device.as_mut() {
            device.stop_running();
        }
        self.running = false;
        self.preview.clear();
        tracing::info!(position = %self.position, "Capture session stopped");
    }

    /// Requests one still. `completion` is always invoked or dropped, even
    /// when the session cannot capture.
    pub fn capture(&mut self, settings: PhotoSettings, completion: PhotoCompletion) {
        let Some(device) = self.device.as_mut() else {
            completion(Err(CameraError::DeviceNotAvailable));
            return;
        };
        if !self.running {
            completion(Err(CameraError::CaptureError(format!(
                "{} session is not running",
                self.position
            ))));
            return;
        }
        tracing::debug!(position = %self.position, flash = ?settings.flash, "Requesting still capture");
        device.capture_photo(settings, completion);
    }
}

impl<D: CameraDevice> Drop for CaptureSession<D> {
    fn drop(&mut self) {
        self.stop();
    }
}

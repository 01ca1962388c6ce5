//! Camera abstraction for still capture.
//!
//! This module provides a trait-based abstraction over the platform camera
//! API, allowing for both real camera hardware and mock implementations for
//! testing. A [`DeviceDiscovery`] hands out one [`CameraDevice`] per sensor
//! position; each device models the platform's device/input/output triple.

use super::{Frame, PreviewSink};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during camera operations.
///
/// Terminal for the operation that raised them. None of them leave a
/// session half-bound, so the operation may be retried once the cause is
/// resolved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CameraError {
    #[error("camera access is not authorized")]
    /// Camera access was denied or restricted.
    NotAuthorized,
    #[error("failed to configure capture session")]
    /// A device input or output could not be attached.
    ConfigurationFailed,
    #[error("no camera device available at the requested position")]
    /// No device exists for the requested position.
    DeviceNotAvailable,
    #[error("capture failed: {0}")]
    /// A still capture failed; the payload carries the device detail.
    CaptureError(String),
    #[error("simultaneous front and back capture is not supported on this device")]
    /// The platform cannot stream both cameras at once.
    MultiCamNotSupported,
}

/// Physical sensor a session binds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraPosition {
    /// User-facing camera.
    Front,
    /// Rear camera.
    Back,
}

impl fmt::Display for CameraPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraPosition::Front => f.write_str("front"),
            CameraPosition::Back => f.write_str("back"),
        }
    }
}

/// Flash behaviour applied to the rear sensor at capture time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashMode {
    /// Never fire.
    Off,
    /// Always fire.
    On,
    #[default]
    /// Fire when the scene is dark.
    Auto,
}

impl FlashMode {
    /// Cycle to the next mode: Off -> On -> Auto -> Off
    pub fn next(self) -> Self {
        match self {
            FlashMode::Off => FlashMode::On,
            FlashMode::On => FlashMode::Auto,
            FlashMode::Auto => FlashMode::Off,
        }
    }
}

/// Per-shot settings handed to a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PhotoSettings {
    /// Flash mode for this still.
    pub flash: FlashMode,
}

impl PhotoSettings {
    /// Settings for a sensor without flash hardware.
    pub fn without_flash() -> Self {
        Self {
            flash: FlashMode::Off,
        }
    }
}

/// Completion invoked exactly once by a device when a still capture settles.
///
/// Devices may call it from any thread, synchronously or later.
pub type PhotoCompletion = Box<dyn FnOnce(Result<Frame, CameraError>) + Send + 'static>;

/// A bound camera device with its input and still-photo output.
///
/// Device handles are created and used on the session queue only, so
/// implementations need not be `Send`.
pub trait CameraDevice {
    /// Human-readable device name for logging.
    fn name(&self) -> &str;

    /// Opens a configuration transaction.
    fn begin_configuration(&mut self);

    /// Commits the current configuration transaction.
    fn commit_configuration(&mut self);

    /// Attaches the video input stream.
    fn attach_input(&mut self) -> Result<(), CameraError>;

    /// Attaches the still-photo output sink.
    fn attach_photo_output(&mut self) -> Result<(), CameraError>;

    /// Starts streaming, publishing live frames into `preview`.
    fn start_running(&mut self, preview: PreviewSink);

    /// Stops streaming.
    fn stop_running(&mut self);

    /// Requests one still capture.
    fn capture_photo(&mut self, settings: PhotoSettings, completion: PhotoCompletion);
}

/// Platform device discovery.
pub trait DeviceDiscovery {
    /// Device handle type produced by this platform.
    type Device: CameraDevice;

    /// Whether front and back sensors may stream at the same time.
    fn supports_multi_cam(&self) -> bool;

    /// Returns the default wide-angle device at `position`, if one exists.
    fn default_device(&mut self, position: CameraPosition) -> Option<Self::Device>;
}

/// Counters shared between a [`MockCamera`] and the test observing it.
#[derive(Debug, Default)]
pub struct MockProbe {
    begins: AtomicUsize,
    commits: AtomicUsize,
    starts: AtomicUsize,
    stops: AtomicUsize,
    captures: AtomicUsize,
    last_flash: Mutex<Option<FlashMode>>,
}

impl MockProbe {
    /// Configuration transactions opened.
    pub fn begins(&self) -> usize {
        self.begins.load(Ordering::SeqCst)
    }

    /// Configuration transactions committed.
    pub fn commits(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    /// Times the device started streaming.
    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    /// Times the device stopped streaming.
    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    /// Still captures requested.
    pub fn captures(&self) -> usize {
        self.captures.load(Ordering::SeqCst)
    }

    /// Flash mode of the most recent capture request.
    pub fn last_flash(&self) -> Option<FlashMode> {
        self.last_flash.lock().ok().and_then(|guard| *guard)
    }
}

/// Mock camera for testing that generates synthetic stills.
///
/// Every capture produces a deterministic gradient that is asymmetric left
/// to right, so mirroring is observable in composites. Failure and timing
/// behaviour can be injected per device.
#[derive(Debug, Clone)]
pub struct MockCamera {
    position: CameraPosition,
    name: String,
    width: u32,
    height: u32,
    sequence: Arc<AtomicU64>,
    in_transaction: bool,
    input_attached: bool,
    output_attached: bool,
    running: bool,
    preview: Option<PreviewSink>,
    fail_input: bool,
    fail_output: bool,
    capture_failure: Option<String>,
    capture_delay: Option<Duration>,
    drop_completions: bool,
    probe: Arc<MockProbe>,
}

impl MockCamera {
    /// A working mock producing `width` x `height` stills.
    pub fn new(position: CameraPosition, width: u32, height: u32) -> Self {
        Self {
            position,
            name: format!("mock-{}", position),
            width,
            height,
            sequence: Arc::new(AtomicU64::new(0)),
            in_transaction: false,
            input_attached: false,
            output_attached: false,
            running: false,
            preview: None,
            fail_input: false,
            fail_output: false,
            capture_failure: None,
            capture_delay: None,
            drop_completions: false,
            probe: Arc::new(MockProbe::default()),
        }
    }

    /// Fails `attach_input` with `ConfigurationFailed`.
    pub fn with_input_failure(mut self) -> Self {
        self.fail_input = true;
        self
    }

    /// Fails `attach_photo_output` with `ConfigurationFailed`.
    pub fn with_output_failure(mut self) -> Self {
        self.fail_output = true;
        self
    }

    /// Reports `CaptureError(message)` for every capture.
    pub fn with_capture_failure(mut self, message: impl Into<String>) -> Self {
        self.capture_failure = Some(message.into());
        self
    }

    /// Delivers capture completions from a helper thread after `delay`.
    pub fn with_capture_delay(mut self, delay: Duration) -> Self {
        self.capture_delay = Some(delay);
        self
    }

    /// Drops completions without invoking them.
    pub fn dropping_completions(mut self) -> Self {
        self.drop_completions = true;
        self
    }

    /// Returns the counters shared by every clone of this camera.
    pub fn probe(&self) -> Arc<MockProbe> {
        Arc::clone(&self.probe)
    }

    /// True while streaming.
    pub fn is_running(&self) -> bool {
        self.running
    }

    fn render(&self, sequence: u64) -> Result<Frame, CameraError> {
        let tint = match self.position {
            CameraPosition::Front => 200u8,
            CameraPosition::Back => 40u8,
        };
        let (w, h) = (self.width.max(1), self.height.max(1));
        let image = image::RgbaImage::from_fn(w, h, |x, y| {
            // NOT a real scene - only an asymmetric pattern for frame handling
            let r = ((x as u64 * 255 / w as u64) ^ sequence) as u8;
            let g = (y as u64 * 255 / h as u64) as u8;
            image::Rgba([r, g, tint, 255])
        });
        Frame::from_image(&image, self.position, sequence)
            .map_err(|e| CameraError::CaptureError(e.to_string()))
    }
}

impl CameraDevice for MockCamera {
    fn name(&self) -> &str {
        &self.name
    }

    fn begin_configuration(&mut self) {
        self.in_transaction = true;
        self.probe.begins.fetch_add(1, Ordering::SeqCst);
    }

    fn commit_configuration(&mut self) {
        self.in_transaction = false;
        self.probe.commits.fetch_add(1, Ordering::SeqCst);
    }

    fn attach_input(&mut self) -> Result<(), CameraError> {
        if self.fail_input {
            return Err(CameraError::ConfigurationFailed);
        }
        self.input_attached = true;
        Ok(())
    }

    fn attach_photo_output(&mut self) -> Result<(), CameraError> {
        if self.fail_output {
            return Err(CameraError::ConfigurationFailed);
        }
        self.output_attached = true;
        Ok(())
    }

    fn start_running(&mut self, preview: PreviewSink) {
        self.running = true;
        self.probe.starts.fetch_add(1, Ordering::SeqCst);

        // Stand in for the live stream with a single frame
        match self.render(0) {
            Ok(frame) => preview.publish(frame),
            Err(e) => tracing::warn!(position = %self.position, error = %e, "Mock preview render failed"),
        }
        self.preview = Some(preview);
        tracing::info!(position = %self.position, "MockCamera started");
    }

    fn stop_running(&mut self) {
        self.running = false;
        self.preview = None;
        self.probe.stops.fetch_add(1, Ordering::SeqCst);
        tracing::info!(position = %self.position, "MockCamera stopped");
    }

    fn capture_photo(&mut self, settings: PhotoSettings, completion: PhotoCompletion) {
        self.probe.captures.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.probe.last_flash.lock() {
            *last = Some(settings.flash);
        }

        if self.drop_completions {
            tracing::debug!(position = %self.position, "Dropping capture completion");
            return;
        }

        let result = match &self.capture_failure {
            Some(message) => Err(CameraError::CaptureError(message.clone())),
            None => {
                let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
                self.render(sequence)
            }
        };

        match self.capture_delay {
            Some(delay) => {
                std::thread::spawn(move || {
                    std::thread::sleep(delay);
                    completion(result);
                });
            }
            None => completion(result),
        }
    }
}

/// Mock discovery serving preconfigured devices.
#[derive(Debug, Clone)]
pub struct MockDiscovery {
    front: Option<MockCamera>,
    back: Option<MockCamera>,
    multi_cam: bool,
}

impl MockDiscovery {
    /// Serves the given devices; either side may be missing.
    pub fn new(front: Option<MockCamera>, back: Option<MockCamera>) -> Self {
        Self {
            front,
            back,
            multi_cam: true,
        }
    }

    /// Both sensors present with the given still resolutions.
    pub fn pair(front: (u32, u32), back: (u32, u32)) -> Self {
        Self::new(
            Some(MockCamera::new(CameraPosition::Front, front.0, front.1)),
            Some(MockCamera::new(CameraPosition::Back, back.0, back.1)),
        )
    }

    /// Reports that simultaneous capture is unavailable.
    pub fn without_multi_cam(mut self) -> Self {
        self.multi_cam = false;
        self
    }
}

impl DeviceDiscovery for MockDiscovery {
    type Device = MockCamera;

    fn supports_multi_cam(&self) -> bool {
        self.multi_cam
    }

    fn default_device(&mut self, position: CameraPosition) -> Option<MockCamera> {
        match position {
            CameraPosition::Front => self.front.clone(),
            CameraPosition::Back => self.back.clone(),
        }
    }
}

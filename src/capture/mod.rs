//! Camera sessions and still capture.
//!
//! This module provides the per-position capture session, the platform
//! camera traits it drives, the frames devices deliver and the preview
//! hand-off used by the UI. Devices are only ever touched from the session
//! queue (see [`crate::controller`]).

mod camera;
mod config;
mod frame;
#[cfg(feature = "camera")]
mod webcam;
pub mod preview;
mod session;

pub use camera::{
    CameraDevice, CameraError, CameraPosition, DeviceDiscovery, FlashMode, MockCamera,
    MockDiscovery, MockProbe, PhotoCompletion, PhotoSettings,
};
pub use config::{CaptureConfig, CompositeConfig, ConfigError, FileConfig};
pub use frame::Frame;
#[cfg(feature = "camera")]
pub use webcam::{Webcam, WebcamDiscovery};
pub use preview::{PreviewSink, PreviewSurface};
pub use session::{CaptureSession, ConfigurationGuard};

//! Desktop webcam devices via `nokhwa`.
//!
//! Two webcams stand in for the front and back sensors. Webcams have no
//! flash hardware and no separate still pipeline, so a still is simply the
//! next streamed frame.

use super::{
    CameraDevice, CameraError, CameraPosition, DeviceDiscovery, Frame, PhotoCompletion,
    PhotoSettings, PreviewSink,
};
use ::nokhwa::pixel_format::RgbFormat;
use ::nokhwa::utils::{ApiBackend, CameraIndex, RequestedFormat, RequestedFormatType};
use ::nokhwa::Camera;

/// Discovery mapping each position to a webcam index.
#[derive(Debug, Clone, Copy)]
pub struct WebcamDiscovery {
    front_index: u32,
    back_index: u32,
}

impl WebcamDiscovery {
    /// Uses webcam `front_index` as the front camera and `back_index` as the back.
    pub fn new(front_index: u32, back_index: u32) -> Self {
        Self {
            front_index,
            back_index,
        }
    }
}

impl Default for WebcamDiscovery {
    fn default() -> Self {
        Self::new(0, 1)
    }
}

impl DeviceDiscovery for WebcamDiscovery {
    type Device = Webcam;

    fn supports_multi_cam(&self) -> bool {
        match ::nokhwa::query(ApiBackend::Auto) {
            Ok(devices) => devices.len() >= 2,
            Err(e) => {
                tracing::warn!(error = %e, "Webcam enumeration failed");
                false
            }
        }
    }

    fn default_device(&mut self, position: CameraPosition) -> Option<Webcam> {
        let index = match position {
            CameraPosition::Front => self.front_index,
            CameraPosition::Back => self.back_index,
        };
        let format = RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestResolution);
        match Camera::new(CameraIndex::Index(index), format) {
            Ok(camera) => Some(Webcam {
                position,
                name: format!("webcam-{}", index),
                camera,
                stream_open: false,
                sequence: 0,
                preview: None,
            }),
            Err(e) => {
                tracing::warn!(position = %position, index, error = %e, "Failed to open webcam");
                None
            }
        }
    }
}

/// One opened webcam.
pub struct Webcam {
    position: CameraPosition,
    name: String,
    camera: Camera,
    stream_open: bool,
    sequence: u64,
    preview: Option<PreviewSink>,
}

impl Webcam {
    fn grab(&mut self) -> Result<Frame, CameraError> {
        let buffer = self
            .camera
            .frame()
            .map_err(|e| CameraError::CaptureError(e.to_string()))?;
        let decoded = buffer
            .decode_image::<RgbFormat>()
            .map_err(|e| CameraError::CaptureError(e.to_string()))?;
        let (width, height) = (decoded.width(), decoded.height());
        let rgb = image::RgbImage::from_raw(width, height, decoded.into_raw())
            .ok_or_else(|| CameraError::CaptureError("webcam frame size mismatch".into()))?;
        let rgba = image::DynamicImage::ImageRgb8(rgb).into_rgba8();

        self.sequence += 1;
        Frame::from_image(&rgba, self.position, self.sequence)
            .map_err(|e| CameraError::CaptureError(e.to_string()))
    }
}

impl CameraDevice for Webcam {
    fn name(&self) -> &str {
        &self.name
    }

    fn begin_configuration(&mut self) {}

    fn commit_configuration(&mut self) {}

    fn attach_input(&mut self) -> Result<(), CameraError> {
        if self.stream_open {
            return Ok(());
        }
        self.camera.open_stream().map_err(|e| {
            tracing::warn!(device = %self.name, error = %e, "Failed to open webcam stream");
            CameraError::ConfigurationFailed
        })?;
        self.stream_open = true;
        Ok(())
    }

    fn attach_photo_output(&mut self) -> Result<(), CameraError> {
        Ok(())
    }

    fn start_running(&mut self, preview: PreviewSink) {
        match self.grab() {
            Ok(frame) => preview.publish(frame),
            Err(e) => tracing::warn!(device = %self.name, error = %e, "Webcam preview grab failed"),
        }
        self.preview = Some(preview);
    }

    fn stop_running(&mut self) {
        self.preview = None;
    }

    fn capture_photo(&mut self, settings: PhotoSettings, completion: PhotoCompletion) {
        tracing::debug!(device = %self.name, flash = ?settings.flash, "Webcam still");
        let result = self.grab();
        if let (Ok(frame), Some(preview)) = (&result, &self.preview) {
            preview.publish(frame.clone());
        }
        completion(result);
    }
}

impl Drop for Webcam {
    fn drop(&mut self) {
        if self.stream_open {
            if let Err(e) = self.camera.stop_stream() {
                tracing::warn!(device = %self.name, error = %e, "Failed to stop webcam stream");
            }
        }
    }
}

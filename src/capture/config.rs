//! Capture and compositing configuration.

use super::{CameraPosition, FlashMode};
use crate::compositor::PipPosition;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for the two capture sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Front still width in pixels (mock devices).
    pub front_width: u32,
    /// Front still height in pixels (mock devices).
    pub front_height: u32,
    /// Back still width in pixels (mock devices).
    pub back_width: u32,
    /// Back still height in pixels (mock devices).
    pub back_height: u32,
    /// Flash mode in effect before the first toggle.
    pub default_flash_mode: FlashMode,
    /// Inset corner in effect before the first toggle.
    pub initial_pip_position: PipPosition,
    /// Refuse to configure when the platform cannot stream both sensors.
    pub require_multi_cam: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            front_width: 720,
            front_height: 960,
            back_width: 1440,
            back_height: 1920,
            default_flash_mode: FlashMode::Auto,
            initial_pip_position: PipPosition::TopLeft,
            require_multi_cam: true,
        }
    }
}

impl CaptureConfig {
    /// Creates a configuration with the given still resolutions.
    pub fn with_dimensions(front: (u32, u32), back: (u32, u32)) -> Self {
        Self {
            front_width: front.0,
            front_height: front.1,
            back_width: back.0,
            back_height: back.1,
            ..Default::default()
        }
    }

    /// Still resolution for `position`.
    pub fn dimensions(&self, position: CameraPosition) -> (u32, u32) {
        match position {
            CameraPosition::Front => (self.front_width, self.front_height),
            CameraPosition::Back => (self.back_width, self.back_height),
        }
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.front_width == 0
            || self.front_height == 0
            || self.back_width == 0
            || self.back_height == 0
        {
            return Err(ConfigError::InvalidDimensions);
        }
        Ok(())
    }
}

/// Geometry and colours of the picture-in-picture inset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositeConfig {
    /// Inset width as a fraction of the background width.
    pub inset_width_ratio: f64,
    /// Distance in pixels between the inset and its anchored edges.
    pub padding: f64,
    /// Outer border width in pixels.
    pub outer_border: u32,
    /// Inner border width in pixels.
    pub inner_border: u32,
    /// Outer ring colour (RGBA).
    pub border_background: [u8; 4],
    /// Inner ring colour (RGBA).
    pub border_foreground: [u8; 4],
}

impl Default for CompositeConfig {
    fn default() -> Self {
        Self {
            inset_width_ratio: 0.28,
            padding: 16.0,
            outer_border: 3,
            inner_border: 1,
            border_background: [0, 0, 0, 255],
            border_foreground: [255, 255, 255, 255],
        }
    }
}

impl CompositeConfig {
    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.inset_width_ratio > 0.0 && self.inset_width_ratio <= 1.0) {
            return Err(ConfigError::InvalidInsetRatio);
        }
        if self.padding.is_nan() || self.padding < 0.0 {
            return Err(ConfigError::InvalidPadding);
        }
        if self.inner_border > self.outer_border {
            return Err(ConfigError::InvalidBorders);
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid still dimensions")]
    /// A still resolution is zero.
    InvalidDimensions,
    #[error("invalid inset width ratio (must be in (0, 1])")]
    /// The inset width ratio is outside (0, 1].
    InvalidInsetRatio,
    #[error("invalid inset padding")]
    /// Padding is negative or NaN.
    InvalidPadding,
    #[error("inner border must not be wider than outer border")]
    /// The inner border is wider than the outer border.
    InvalidBorders,
    #[error("failed to read config file: {0}")]
    /// The configuration file could not be read.
    FileReadError(String),
    #[error("failed to parse config file: {0}")]
    /// The configuration file is not valid TOML.
    ParseError(String),
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    #[serde(default)]
    /// Camera and capture settings.
    pub capture: CaptureConfig,
    #[serde(default)]
    /// Inset layout and border colours.
    pub composite: CompositeConfig,
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: FileConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates both sections.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.capture.validate()?;
        self.composite.validate()
    }
}

//! Inset corner placement.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Corner the picture-in-picture inset is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PipPosition {
    #[default]
    /// Upper-left corner.
    TopLeft,
    /// Upper-right corner.
    TopRight,
    /// Lower-left corner.
    BottomLeft,
    /// Lower-right corner.
    BottomRight,
}

impl PipPosition {
    /// All positions in rotation order.
    pub const ALL: [PipPosition; 4] = [
        PipPosition::TopLeft,
        PipPosition::TopRight,
        PipPosition::BottomLeft,
        PipPosition::BottomRight,
    ];

    /// Next position in the rotation
    /// TopLeft -> TopRight -> BottomLeft -> BottomRight -> TopLeft.
    pub fn next(self) -> Self {
        match self {
            PipPosition::TopLeft => PipPosition::TopRight,
            PipPosition::TopRight => PipPosition::BottomLeft,
            PipPosition::BottomLeft => PipPosition::BottomRight,
            PipPosition::BottomRight => PipPosition::TopLeft,
        }
    }

    #[inline]
    /// True for the two left corners.
    pub fn is_left(self) -> bool {
        matches!(self, PipPosition::TopLeft | PipPosition::BottomLeft)
    }

    #[inline]
    /// True for the two top corners.
    pub fn is_top(self) -> bool {
        matches!(self, PipPosition::TopLeft | PipPosition::TopRight)
    }
}

impl fmt::Display for PipPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PipPosition::TopLeft => "top-left",
            PipPosition::TopRight => "top-right",
            PipPosition::BottomLeft => "bottom-left",
            PipPosition::BottomRight => "bottom-right",
        })
    }
}

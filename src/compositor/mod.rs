//! Picture-in-picture compositing.
//!
//! Combines a full-frame back still with a mirrored, bordered front still
//! inset anchored at one of four corners.

mod composite;
mod geometry;
mod position;

pub use composite::Compositor;
pub use geometry::{InsetRect, PixelRect};
pub use position::PipPosition;

//! Dual Camera Capture Library
//!
//! Drives the front and rear cameras as two concurrent capture sessions,
//! fires a still capture on both at once and combines the pair into one
//! composite: the rear still fills the frame and the front still sits in a
//! mirrored, bordered picture-in-picture inset.
//!
//! # Architecture
//!
//! ```text
//! auth ─→ controller ─→ session queue ─→ capture sessions (front, back)
//!             │                                  │
//!             └── coordinator ←── join ←─────────┘ completions
//!                     │
//!                 compositor
//! ```
//!
//! # Design Principles
//!
//! - **One owner per device**: sessions and their devices live on a single
//!   queue thread; nothing else touches camera handles
//! - **Two-of-two join**: a capture resolves exactly once, on the first
//!   error or after both sides succeed, in whatever order they finish
//! - **Pure compositing**: the compositor is a function of two images and a
//!   corner; toggling the corner recomposites without recapturing
//! - **State as snapshots**: user-visible state is published, not shared
//!
//! # Example
//!
//! ```
//! use dual_capture::{
//!     auth::StaticAuthorization,
//!     capture::{FileConfig, MockDiscovery},
//!     controller::DualSessionController,
//! };
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let discovery = MockDiscovery::pair((90, 120), (320, 240));
//! let mut controller = DualSessionController::new(
//!     discovery,
//!     StaticAuthorization::granted(),
//!     &FileConfig::default(),
//! )
//! .unwrap();
//!
//! assert!(controller.check_authorization().await);
//! controller.start_sessions().await.unwrap();
//!
//! controller.capture_dual_photo().await.unwrap();
//! let composite = controller.result().composite_image().unwrap();
//! assert_eq!(composite.dimensions(), (320, 240));
//!
//! controller.toggle_pip_position();
//! controller.clear_captures();
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod auth;
pub mod capture;
pub mod compositor;
pub mod controller;
pub mod metrics;

// Re-export commonly used types at crate root
pub use auth::{AuthorizationProvider, AuthorizationStatus, PermissionGate};
pub use capture::{CameraError, CameraPosition, FileConfig, FlashMode, Frame, PreviewSurface};
pub use compositor::{Compositor, PipPosition};
pub use controller::{CaptureResult, ControllerSnapshot, DualSessionController};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

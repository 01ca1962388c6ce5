//! Dual-session control and capture coordination.
//!
//! [`DualSessionController`] is the surface the UI talks to. Underneath,
//! a [`SessionQueue`] thread owns both sessions and a
//! [`CaptureCoordinator`] joins the two capture completions before
//! compositing.

mod coordinator;
mod dual;
mod join;
mod queue;
mod sessions;

pub use coordinator::{CaptureCoordinator, CaptureResult, CaptureStats, CompositeUpload};
pub use dual::{ControllerSnapshot, DualSessionController};
pub use join::{CaptureJoin, JoinOutcome, JoinState};
pub use queue::{SessionQueue, Ticket};
pub use sessions::{CompletionSender, ConfigureReport, DualSessions, SessionStatus};

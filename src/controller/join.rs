//! Two-of-two join over the front and back capture completions.

use crate::capture::{CameraError, CameraPosition, Frame};

/// Progress of one dual capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinState {
    /// No completion yet.
    Pending,
    /// Only the front side has reported.
    FrontDone,
    /// Only the back side has reported.
    BackDone,
    /// Settled; later completions are ignored.
    BothDone,
}

/// Settled outcome of a dual capture.
#[derive(Debug)]
pub enum JoinOutcome {
    /// Both stills arrived.
    Captured {
        /// Front still.
        front: Frame,
        /// Back still.
        back: Frame,
    },
    /// First error reported by either side.
    Failed(CameraError),
}

/// Collects both completions and yields the outcome exactly once.
///
/// Completions may arrive in either order. Two successes settle the join on
/// the second one; an error settles it immediately. Anything recorded after
/// that is ignored.
#[derive(Debug)]
pub struct CaptureJoin {
    state: JoinState,
    front: Option<Frame>,
    back: Option<Frame>,
}

impl CaptureJoin {
    /// An unsettled join.
    pub fn new() -> Self {
        Self {
            state: JoinState::Pending,
            front: None,
            back: None,
        }
    }

    /// Current progress.
    pub fn state(&self) -> JoinState {
        self.state
    }

    /// Records one side's completion.
    ///
    /// Returns the outcome when this completion settles the join. Repeat
    /// completions for an already settled side are ignored.
    pub fn record(
        &mut self,
        position: CameraPosition,
        result: Result<Frame, CameraError>,
    ) -> Option<JoinOutcome> {
        let next = match (self.state, position) {
            (JoinState::Pending, CameraPosition::Front) => JoinState::FrontDone,
            (JoinState::Pending, CameraPosition::Back) => JoinState::BackDone,
            (JoinState::BackDone, CameraPosition::Front)
            | (JoinState::FrontDone, CameraPosition::Back) => JoinState::BothDone,
            (state, position) => {
                tracing::warn!(?state, position = %position, "Ignoring repeated capture completion");
                return None;
            }
        };

        match result {
            Ok(frame) => {
                tracing::debug!(position = %position, sequence = frame.sequence(), "Capture side done");
                match position {
                    CameraPosition::Front => self.front = Some(frame),
                    CameraPosition::Back => self.back = Some(frame),
                }
            }
            Err(e) => {
                tracing::warn!(position = %position, error = %e, "Capture side failed");
                self.state = JoinState::BothDone;
                self.front = None;
                self.back = None;
                return Some(JoinOutcome::Failed(e));
            }
        }

        self.state = next;
        if next != JoinState::BothDone {
            return None;
        }

        match (self.front.take(), self.back.take()) {
            (Some(front), Some(back)) => Some(JoinOutcome::Captured { front, back }),
            _ => Some(JoinOutcome::Failed(CameraError::CaptureError(
                "capture completed without an image".into(),
            ))),
        }
    }
}

impl Default for CaptureJoin {
    fn default() -> Self {
        Self::new()
    }
}

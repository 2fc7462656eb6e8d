//! Session events.
//!
//! High-level state changes that a UI layer or the CLI cares about.
//! They are broadcast through a [`tokio::sync::broadcast`] channel; see
//! [`crate::session::DiveSession::subscribe`].

use oceaneye_core::navigation::AppMode;
use serde::Serialize;

/// Broadcast channel capacity for session events.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SessionEvent {
    CameraOpened,

    CameraClosed,

    RecordingStarted,

    /// A clip was finalized and is ready for submission.
    RecordingFinished { bytes: usize },

    FileSelected { name: String },

    /// A one-shot submission was sent.
    SubmissionStarted { kind: &'static str },

    /// A one-shot submission replaced the detection log.
    DetectionsReplaced { total: usize },

    /// A one-shot submission failed; `message` is what the user sees.
    SubmissionFailed { message: String },

    /// The live-sampling task started ticking.
    LiveStarted,

    /// The live-sampling task was torn down.
    LiveStopped,

    /// A live tick appended sightings to the log.
    DetectionsAppended { added: usize, total: usize },

    ModeChanged { from: AppMode, to: AppMode, reset: bool },
}

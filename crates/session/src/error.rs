use oceaneye_detector::api::DetectorApiError;

use crate::device::DeviceError;

/// Errors reported by session operations.
///
/// Everything except [`SessionError::SubmissionInFlight`] is surfaced to
/// the user through the session's error indicator. Live-sampling
/// failures never become a `SessionError`; see
/// [`crate::live::LiveTickFailure`].
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The camera was denied or could not be opened.
    #[error("Unable to access the camera: {0}")]
    CameraUnavailable(String),

    /// The selected file is not a video.
    #[error("Please select a valid video file (got '{mime}')")]
    InvalidFileType { mime: String },

    /// Nothing to submit in the current input mode.
    #[error("Select a video or record a clip first")]
    NoInputSelected,

    /// A one-shot submission is already running.
    #[error("A detection request is already in progress")]
    SubmissionInFlight,

    /// The service processed the request and reported a failure.
    #[error("Detection failed: {0}")]
    Service(String),

    /// The service could not be reached or answered garbage. The detail
    /// is kept for logs; the user sees a generic message.
    #[error("Network error, please check the detection service connection")]
    Transport(String),

    /// The recorder failed while finalizing a clip.
    #[error("Recording failed: {0}")]
    Device(String),
}

impl SessionError {
    /// Whether the error belongs on the persistent error indicator.
    pub fn is_surfaced(&self) -> bool {
        !matches!(self, SessionError::SubmissionInFlight)
    }
}

impl From<DetectorApiError> for SessionError {
    fn from(e: DetectorApiError) -> Self {
        match e {
            DetectorApiError::Service(msg) => SessionError::Service(msg),
            other => SessionError::Transport(other.to_string()),
        }
    }
}

impl From<DeviceError> for SessionError {
    fn from(e: DeviceError) -> Self {
        SessionError::Device(e.to_string())
    }
}

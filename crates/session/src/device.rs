//! Camera and recorder seams.
//!
//! Device APIs are modelled as async operations that either succeed or
//! return a [`DeviceError`]. A stream is shared (`Arc`) between the
//! capture controller and the live-sampling task, so every method takes
//! `&self` and implementations keep their own interior state.

use std::sync::Arc;

use async_trait::async_trait;
use oceaneye_core::media::MediaBlob;

/// Which camera to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Facing {
    /// Rear camera, pointing at the scene.
    #[default]
    Environment,
    User,
}

/// Constraints for opening a video stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamRequest {
    pub facing: Facing,
    pub ideal_width: u32,
    pub ideal_height: u32,
}

impl Default for StreamRequest {
    fn default() -> Self {
        Self {
            facing: Facing::Environment,
            ideal_width: 720,
            ideal_height: 1080,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("Camera permission denied")]
    PermissionDenied,

    #[error("No camera available")]
    NotFound,

    #[error("Camera stream is not live")]
    StreamStopped,

    #[error("Recording is not supported by this camera")]
    RecordingUnsupported,

    #[error("Device I/O error: {0}")]
    Io(String),
}

/// Grants camera streams.
#[async_trait]
pub trait CameraDevice: Send + Sync {
    async fn open(&self, request: &StreamRequest) -> Result<Arc<dyn CameraStream>, DeviceError>;
}

/// A granted, running video stream.
#[async_trait]
pub trait CameraStream: Send + Sync {
    /// Whether any track is still producing video.
    fn is_live(&self) -> bool;

    /// Stop every track. Idempotent.
    fn stop(&self);

    /// Encode the current frame as JPEG. `Ok(None)` means the stream has
    /// no frame yet (still warming up).
    async fn grab_frame(&self) -> Result<Option<MediaBlob>, DeviceError>;

    /// Begin buffering the stream into a clip.
    fn start_recording(&self) -> Result<Box<dyn Recording>, DeviceError>;
}

/// An in-progress recording.
#[async_trait]
pub trait Recording: Send + Sync {
    /// Stop buffering and assemble the chunks into one clip.
    async fn finish(self: Box<Self>) -> Result<MediaBlob, DeviceError>;

    /// Stop buffering and discard everything recorded.
    fn abort(self: Box<Self>);
}

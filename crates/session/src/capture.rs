//! Media capture controller.
//!
//! Owns the camera stream, the in-progress recording, the last finalized
//! clip and the selected file, and turns whichever matches the current
//! [`InputSource`] into a [`PendingInput`].
//!
//! The camera is either fully bound or not bound at all: a failed open
//! leaves the controller [`CaptureState::Inactive`].

use std::sync::Arc;

use chrono::Utc;
use oceaneye_core::media::{MediaBlob, PendingInput, CLIP_MIME};

use crate::device::{CameraDevice, CameraStream, DeviceError, Recording, StreamRequest};
use crate::error::SessionError;

/// Which input a one-shot submission uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputSource {
    #[default]
    Camera,
    File,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Inactive,
    Active,
    Recording,
}

/// A user-picked video file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub blob: MediaBlob,
}

/// Outcome of [`MediaCaptureController::toggle_recording`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingToggle {
    Started,
    /// A clip of `bytes` bytes was finalized.
    Finished { bytes: usize },
    /// Camera inactive; nothing happened.
    Ignored,
}

pub struct MediaCaptureController {
    device: Arc<dyn CameraDevice>,
    request: StreamRequest,
    stream: Option<Arc<dyn CameraStream>>,
    recording: Option<Box<dyn Recording>>,
    recorded_clip: Option<MediaBlob>,
    selected_file: Option<SelectedFile>,
    source: InputSource,
}

impl MediaCaptureController {
    pub fn new(device: Arc<dyn CameraDevice>, request: StreamRequest) -> Self {
        Self {
            device,
            request,
            stream: None,
            recording: None,
            recorded_clip: None,
            selected_file: None,
            source: InputSource::default(),
        }
    }

    pub fn state(&self) -> CaptureState {
        match (&self.stream, &self.recording) {
            (None, _) => CaptureState::Inactive,
            (Some(_), None) => CaptureState::Active,
            (Some(_), Some(_)) => CaptureState::Recording,
        }
    }

    pub fn is_active(&self) -> bool {
        self.stream.is_some()
    }

    /// The bound stream, shared with the live-sampling task.
    pub fn stream(&self) -> Option<Arc<dyn CameraStream>> {
        self.stream.clone()
    }

    pub fn source(&self) -> InputSource {
        self.source
    }

    pub fn recorded_clip(&self) -> Option<&MediaBlob> {
        self.recorded_clip.as_ref()
    }

    pub fn selected_file(&self) -> Option<&SelectedFile> {
        self.selected_file.as_ref()
    }

    /// Open the rear camera.
    ///
    /// Returns `Ok(false)` when the camera was already active.
    pub async fn open_camera(&mut self) -> Result<bool, DeviceError> {
        if self.stream.is_some() {
            return Ok(false);
        }

        let stream = self.device.open(&self.request).await?;
        if !stream.is_live() {
            stream.stop();
            return Err(DeviceError::StreamStopped);
        }

        tracing::info!(
            width = self.request.ideal_width,
            height = self.request.ideal_height,
            "Camera opened",
        );
        self.stream = Some(stream);
        Ok(true)
    }

    /// Abort any recording and stop every track. Returns whether the
    /// camera was active.
    pub fn close_camera(&mut self) -> bool {
        if let Some(recording) = self.recording.take() {
            recording.abort();
            tracing::debug!("In-progress recording discarded");
        }

        match self.stream.take() {
            Some(stream) => {
                stream.stop();
                tracing::info!("Camera closed");
                true
            }
            None => false,
        }
    }

    /// Start a recording, or finalize the running one into a clip.
    pub async fn toggle_recording(&mut self) -> Result<RecordingToggle, DeviceError> {
        let Some(stream) = self.stream.as_ref() else {
            return Ok(RecordingToggle::Ignored);
        };

        match self.recording.take() {
            None => {
                self.recording = Some(stream.start_recording()?);
                tracing::info!("Recording started");
                Ok(RecordingToggle::Started)
            }
            Some(recording) => {
                let name = format!("dive-record-{}.mp4", Utc::now().timestamp_millis());
                let clip = recording.finish().await?.with_mime(CLIP_MIME).with_file_name(name);
                let bytes = clip.len();
                tracing::info!(bytes, file_name = clip.file_name(), "Recording finalized");
                self.recorded_clip = Some(clip);
                Ok(RecordingToggle::Finished { bytes })
            }
        }
    }

    /// Accept a user-picked file if it is a video.
    ///
    /// A valid file replaces the prior selection and drops the recorded
    /// clip. An invalid one leaves everything untouched.
    pub fn select_file(&mut self, name: impl Into<String>, blob: MediaBlob) -> Result<(), SessionError> {
        if !blob.is_video() {
            return Err(SessionError::InvalidFileType {
                mime: blob.mime().to_string(),
            });
        }

        let name = name.into();
        tracing::info!(file_name = %name, bytes = blob.len(), "Video file selected");
        self.selected_file = Some(SelectedFile { name, blob });
        self.recorded_clip = None;
        Ok(())
    }

    pub fn set_source(&mut self, source: InputSource) {
        self.source = source;
    }

    /// The input a one-shot submission would send right now.
    pub fn pending_input(&self) -> Result<PendingInput, SessionError> {
        match self.source {
            InputSource::File => self
                .selected_file
                .as_ref()
                .map(|f| PendingInput::File {
                    blob: f.blob.clone(),
                    name: f.name.clone(),
                })
                .ok_or(SessionError::NoInputSelected),
            InputSource::Camera => self
                .recorded_clip
                .as_ref()
                .map(|blob| PendingInput::RecordedClip { blob: blob.clone() })
                .ok_or(SessionError::NoInputSelected),
        }
    }

    /// Close the camera and forget every input.
    pub fn reset(&mut self) {
        self.close_camera();
        self.recorded_clip = None;
        self.selected_file = None;
    }
}

impl Drop for MediaCaptureController {
    fn drop(&mut self) {
        self.close_camera();
    }
}

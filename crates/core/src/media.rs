//! Media payloads exchanged between the capture side and the detector.
//!
//! A [`MediaBlob`] is an immutable byte buffer tagged with its MIME type
//! and a file name. Clones share the buffer, so handing a blob to a
//! request does not copy the video.

use std::sync::Arc;

/// MIME type of clips produced by the recorder.
pub const CLIP_MIME: &str = "video/mp4";

/// MIME type of frames grabbed for live sampling.
pub const FRAME_MIME: &str = "image/jpeg";

/// File name used for every live-sampled frame upload.
pub const FRAME_FILE_NAME: &str = "frame.jpg";

/// Immutable media bytes with their content metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaBlob {
    bytes: Arc<[u8]>,
    mime: String,
    file_name: String,
}

impl MediaBlob {
    pub fn new(bytes: impl Into<Arc<[u8]>>, mime: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            mime: mime.into(),
            file_name: file_name.into(),
        }
    }

    /// Same bytes and MIME type under another file name.
    pub fn with_file_name(self, file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            ..self
        }
    }

    /// Same bytes under another MIME type.
    pub fn with_mime(self, mime: impl Into<String>) -> Self {
        Self {
            mime: mime.into(),
            ..self
        }
    }

    /// A JPEG frame named the way the frame endpoint expects.
    pub fn jpeg_frame(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self::new(bytes, FRAME_MIME, FRAME_FILE_NAME)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// A handle to the underlying buffer, for consumers that need owned
    /// bytes without copying them.
    pub fn shared_bytes(&self) -> Arc<[u8]> {
        Arc::clone(&self.bytes)
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Whether the MIME type declares a video container (`video/*`).
    pub fn is_video(&self) -> bool {
        is_video_mime(&self.mime)
    }
}

/// Returns `true` for `video/<subtype>` MIME types, ignoring case and
/// parameters such as `;codecs=...`.
pub fn is_video_mime(mime: &str) -> bool {
    let essence = mime.split(';').next().unwrap_or_default().trim();
    match essence.split_once('/') {
        Some((top, sub)) => top.eq_ignore_ascii_case("video") && !sub.is_empty(),
        None => false,
    }
}

/// Input ready to be handed to the detector, consumed by exactly one
/// submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingInput {
    /// A video file picked by the user.
    File { blob: MediaBlob, name: String },
    /// A clip finalized by the camera recorder.
    RecordedClip { blob: MediaBlob },
    /// One still frame grabbed from the live camera.
    LiveFrame { image: MediaBlob },
}

impl PendingInput {
    /// The payload that goes on the wire.
    pub fn blob(&self) -> &MediaBlob {
        match self {
            PendingInput::File { blob, .. } => blob,
            PendingInput::RecordedClip { blob } => blob,
            PendingInput::LiveFrame { image } => image,
        }
    }

    /// Short label used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            PendingInput::File { .. } => "file",
            PendingInput::RecordedClip { .. } => "recorded_clip",
            PendingInput::LiveFrame { .. } => "live_frame",
        }
    }

    /// Clip inputs go to the clip endpoint, frames to the frame endpoint.
    pub fn is_clip(&self) -> bool {
        !matches!(self, PendingInput::LiveFrame { .. })
    }
}

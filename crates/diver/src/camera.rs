//! Directory-backed still-frame camera.
//!
//! [`DirectoryCamera`] stands in for a real camera on machines without
//! one: every image file in a directory is a frame, served in file-name
//! order and looped. Frames are decoded with the `image` crate and
//! re-encoded as JPEG so the frame endpoint always receives
//! `image/jpeg`, whatever the source format.
//!
//! Recording is not supported.

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat};
use oceaneye_core::media::MediaBlob;
use oceaneye_session::device::{CameraDevice, CameraStream, DeviceError, Recording, StreamRequest};

/// File extensions treated as frames.
const FRAME_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

pub struct DirectoryCamera {
    dir: PathBuf,
}

impl DirectoryCamera {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl CameraDevice for DirectoryCamera {
    async fn open(&self, request: &StreamRequest) -> Result<Arc<dyn CameraStream>, DeviceError> {
        let frames = list_frames(&self.dir).await?;
        if frames.is_empty() {
            tracing::warn!(dir = %self.dir.display(), "No frame images found");
            return Err(DeviceError::NotFound);
        }

        tracing::info!(
            dir = %self.dir.display(),
            frame_count = frames.len(),
            ideal_width = request.ideal_width,
            ideal_height = request.ideal_height,
            "Directory camera opened",
        );

        Ok(Arc::new(DirectoryStream {
            frames,
            request: *request,
            cursor: AtomicUsize::new(0),
            live: AtomicBool::new(true),
        }))
    }
}

struct DirectoryStream {
    frames: Vec<PathBuf>,
    request: StreamRequest,
    cursor: AtomicUsize,
    live: AtomicBool,
}

#[async_trait]
impl CameraStream for DirectoryStream {
    fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    fn stop(&self) {
        self.live.store(false, Ordering::SeqCst);
    }

    async fn grab_frame(&self) -> Result<Option<MediaBlob>, DeviceError> {
        if !self.is_live() {
            return Err(DeviceError::StreamStopped);
        }

        let index = self.cursor.fetch_add(1, Ordering::SeqCst) % self.frames.len();
        let path = &self.frames[index];
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| DeviceError::Io(format!("{}: {e}", path.display())))?;

        let request = self.request;
        let jpeg = tokio::task::spawn_blocking(move || encode_frame(&bytes, &request))
            .await
            .map_err(|e| DeviceError::Io(e.to_string()))??;

        tracing::debug!(frame = %path.display(), bytes = jpeg.len(), "Frame grabbed");
        Ok(Some(MediaBlob::jpeg_frame(jpeg)))
    }

    fn start_recording(&self) -> Result<Box<dyn Recording>, DeviceError> {
        Err(DeviceError::RecordingUnsupported)
    }
}

/// Sorted image files directly inside `dir`.
pub async fn list_frames(dir: &Path) -> Result<Vec<PathBuf>, DeviceError> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| DeviceError::Io(format!("{}: {e}", dir.display())))?;

    let mut frames = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| DeviceError::Io(e.to_string()))?
    {
        let path = entry.path();
        if is_frame_file(&path) {
            frames.push(path);
        }
    }
    frames.sort();
    Ok(frames)
}

fn is_frame_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| FRAME_EXTENSIONS.iter().any(|f| f.eq_ignore_ascii_case(ext)))
}

/// Decode an image and re-encode it as JPEG.
fn encode_frame(bytes: &[u8], request: &StreamRequest) -> Result<Vec<u8>, DeviceError> {
    let decoded = image::load_from_memory(bytes).map_err(|e| DeviceError::Io(format!("decode frame: {e}")))?;

    if decoded.width() != request.ideal_width || decoded.height() != request.ideal_height {
        tracing::trace!(
            width = decoded.width(),
            height = decoded.height(),
            "Frame size differs from the requested resolution",
        );
    }

    // The JPEG encoder rejects alpha channels.
    let rgb = DynamicImage::ImageRgb8(decoded.to_rgb8());
    let mut out = Cursor::new(Vec::new());
    rgb.write_to(&mut out, ImageFormat::Jpeg)
        .map_err(|e| DeviceError::Io(format!("encode frame: {e}")))?;
    Ok(out.into_inner())
}

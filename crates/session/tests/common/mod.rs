//! Shared test doubles for the session integration tests.
//!
//! - [`FakeCamera`] hands out [`FakeStream`]s whose liveness and frame
//!   readiness the test controls.
//! - [`ScriptedDetector`] answers with canned replies after a
//!   configurable delay and counts every call.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use oceaneye_core::detection::ClassCount;
use oceaneye_core::media::{MediaBlob, CLIP_MIME};
use oceaneye_core::presentation::ResultReference;
use oceaneye_detector::api::DetectorApiError;
use oceaneye_detector::service::{DetectionResponse, DetectionService};
use oceaneye_session::config::SessionConfig;
use oceaneye_session::device::{CameraDevice, CameraStream, DeviceError, Recording, StreamRequest};
use oceaneye_session::session::DiveSession;

pub const TICK: Duration = Duration::from_millis(2000);

// ---------------------------------------------------------------------------
// Camera
// ---------------------------------------------------------------------------

pub struct FakeStream {
    live: AtomicBool,
    frame_ready: Arc<AtomicBool>,
    pub grabs: AtomicUsize,
    pub aborted_recordings: Arc<AtomicUsize>,
}

impl FakeStream {
    pub fn is_stopped(&self) -> bool {
        !self.live.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CameraStream for FakeStream {
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
        self.grabs.fetch_add(1, Ordering::SeqCst);
        if !self.frame_ready.load(Ordering::SeqCst) {
            return Ok(None);
        }
        Ok(Some(MediaBlob::jpeg_frame(vec![0xFF, 0xD8, 0xFF, 0xD9])))
    }

    fn start_recording(&self) -> Result<Box<dyn Recording>, DeviceError> {
        Ok(Box::new(FakeRecording {
            aborted: self.aborted_recordings.clone(),
        }))
    }
}

struct FakeRecording {
    aborted: Arc<AtomicUsize>,
}

#[async_trait]
impl Recording for FakeRecording {
    async fn finish(self: Box<Self>) -> Result<MediaBlob, DeviceError> {
        Ok(MediaBlob::new(vec![7u8; 128], CLIP_MIME, "chunks"))
    }

    fn abort(self: Box<Self>) {
        self.aborted.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct FakeCamera {
    pub deny: AtomicBool,
    open_delay: Mutex<Duration>,
    pub frame_ready: Arc<AtomicBool>,
    pub aborted_recordings: Arc<AtomicUsize>,
    streams: Mutex<Vec<Arc<FakeStream>>>,
}

impl FakeCamera {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            deny: AtomicBool::new(false),
            open_delay: Mutex::new(Duration::ZERO),
            frame_ready: Arc::new(AtomicBool::new(true)),
            aborted_recordings: Arc::new(AtomicUsize::new(0)),
            streams: Mutex::new(Vec::new()),
        })
    }

    /// Make `open` take this long, as a permission prompt would.
    pub fn set_open_delay(&self, delay: Duration) {
        *self.open_delay.lock().unwrap() = delay;
    }

    pub fn streams(&self) -> Vec<Arc<FakeStream>> {
        self.streams.lock().unwrap().clone()
    }

    pub fn any_live(&self) -> bool {
        self.streams().iter().any(|s| !s.is_stopped())
    }
}

#[async_trait]
impl CameraDevice for FakeCamera {
    async fn open(&self, _request: &StreamRequest) -> Result<Arc<dyn CameraStream>, DeviceError> {
        let delay = *self.open_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.deny.load(Ordering::SeqCst) {
            return Err(DeviceError::PermissionDenied);
        }
        let stream = Arc::new(FakeStream {
            live: AtomicBool::new(true),
            frame_ready: self.frame_ready.clone(),
            grabs: AtomicUsize::new(0),
            aborted_recordings: self.aborted_recordings.clone(),
        });
        self.streams.lock().unwrap().push(stream.clone());
        Ok(stream as Arc<dyn CameraStream>)
    }
}

// ---------------------------------------------------------------------------
// Detector
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum Reply {
    Ok(DetectionResponse),
    Service(String),
    Status(u16),
}

impl Reply {
    fn into_result(self) -> Result<DetectionResponse, DetectorApiError> {
        match self {
            Reply::Ok(response) => Ok(response),
            Reply::Service(msg) => Err(DetectorApiError::Service(msg)),
            Reply::Status(status) => Err(DetectorApiError::ApiError {
                status,
                body: "upstream unavailable".to_string(),
            }),
        }
    }
}

pub fn counts(entries: &[(u32, u32, bool)]) -> Vec<ClassCount> {
    entries
        .iter()
        .map(|&(class_id, count, is_toxic)| ClassCount {
            class_id,
            count,
            is_toxic,
        })
        .collect()
}

pub fn clip_reply(entries: &[(u32, u32, bool)]) -> Reply {
    Reply::Ok(DetectionResponse {
        counts: counts(entries),
        result: Some(ResultReference {
            play_url: "/output_video/abc_output.mp4".to_string(),
            local_path: Some("output_video/abc_output.mp4".to_string()),
            dimensions: None,
        }),
    })
}

pub fn frame_reply(entries: &[(u32, u32, bool)]) -> Reply {
    Reply::Ok(DetectionResponse {
        counts: counts(entries),
        result: None,
    })
}

pub struct ScriptedDetector {
    clip: Mutex<Reply>,
    frame: Mutex<Reply>,
    clip_delay: Mutex<Duration>,
    frame_delay: Mutex<Duration>,
    clip_calls: AtomicUsize,
    frame_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedDetector {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            clip: Mutex::new(clip_reply(&[(3, 2, true)])),
            frame: Mutex::new(frame_reply(&[(5, 1, false)])),
            clip_delay: Mutex::new(Duration::ZERO),
            frame_delay: Mutex::new(Duration::ZERO),
            clip_calls: AtomicUsize::new(0),
            frame_calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        })
    }

    pub fn set_clip(&self, reply: Reply) {
        *self.clip.lock().unwrap() = reply;
    }

    pub fn set_frame(&self, reply: Reply) {
        *self.frame.lock().unwrap() = reply;
    }

    pub fn set_clip_delay(&self, delay: Duration) {
        *self.clip_delay.lock().unwrap() = delay;
    }

    pub fn set_frame_delay(&self, delay: Duration) {
        *self.frame_delay.lock().unwrap() = delay;
    }

    pub fn clip_calls(&self) -> usize {
        self.clip_calls.load(Ordering::SeqCst)
    }

    pub fn frame_calls(&self) -> usize {
        self.frame_calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn answer(&self, reply: Reply, delay: Duration) -> Result<DetectionResponse, DetectorApiError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        reply.into_result()
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl DetectionService for ScriptedDetector {
    async fn detect_clip(&self, _clip: &MediaBlob) -> Result<DetectionResponse, DetectorApiError> {
        self.clip_calls.fetch_add(1, Ordering::SeqCst);
        let reply = self.clip.lock().unwrap().clone();
        let delay = *self.clip_delay.lock().unwrap();
        self.answer(reply, delay).await
    }

    async fn detect_frame(&self, _frame: &MediaBlob) -> Result<DetectionResponse, DetectorApiError> {
        self.frame_calls.fetch_add(1, Ordering::SeqCst);
        let reply = self.frame.lock().unwrap().clone();
        let delay = *self.frame_delay.lock().unwrap();
        self.answer(reply, delay).await
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

pub struct Harness {
    pub session: Arc<DiveSession>,
    pub camera: Arc<FakeCamera>,
    pub detector: Arc<ScriptedDetector>,
}

pub fn harness() -> Harness {
    harness_with_interval(TICK)
}

pub fn harness_with_interval(live_interval: Duration) -> Harness {
    let camera = FakeCamera::new();
    let detector = ScriptedDetector::new();
    let config = SessionConfig {
        live_interval,
        ..SessionConfig::default()
    };
    let session = Arc::new(DiveSession::new(config, camera.clone(), detector.clone()));
    Harness {
        session,
        camera,
        detector,
    }
}

pub fn video(name: &str) -> MediaBlob {
    MediaBlob::new(vec![1u8; 32], CLIP_MIME, name)
}

/// Let spawned tasks run until they block.
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

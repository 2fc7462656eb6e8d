//! Detection service reply types and parser.
//!
//! Both endpoints answer with an envelope of the shape
//! `{"code": 1, "msg": "...", "result": {...}}`. Any code other than `1`
//! is a service-side failure whose `msg` is shown to the user.

use oceaneye_core::detection::ClassCount;
use oceaneye_core::presentation::{ResultReference, VideoDimensions};
use serde::Deserialize;

use crate::service::DetectionResponse;

/// Envelope code the service uses for success.
pub const CODE_SUCCESS: i64 = 1;

/// Upper bound on the sightings one reply may report. Every sighting
/// becomes a log record, so larger totals are treated as corrupt.
pub const MAX_SIGHTINGS: u64 = 10_000;

/// Outer reply envelope shared by both endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    pub code: i64,
    #[serde(default)]
    pub msg: Option<String>,
    /// Endpoint-specific payload; `{}` or missing on failure.
    #[serde(default)]
    pub result: Option<serde_json::Value>,
}

/// One per-class entry of a reply.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct WireDetection {
    pub class_id: u32,
    pub count: u32,
    #[serde(default)]
    pub is_toxic: bool,
}

impl From<WireDetection> for ClassCount {
    fn from(d: WireDetection) -> Self {
        ClassCount {
            class_id: d.class_id,
            count: d.count,
            is_toxic: d.is_toxic,
        }
    }
}

/// Payload of a successful clip detection.
#[derive(Debug, Clone, Deserialize)]
pub struct ClipResult {
    pub video_play_url: String,
    #[serde(default)]
    pub video_local_path: Option<String>,
    #[serde(default)]
    pub video_width: Option<u32>,
    #[serde(default)]
    pub video_height: Option<u32>,
    #[serde(default)]
    pub detections: Vec<WireDetection>,
}

/// Payload of a successful frame detection. Image URL fields the
/// service also returns are not used.
#[derive(Debug, Clone, Deserialize)]
pub struct FrameResult {
    #[serde(default)]
    pub detections: Vec<WireDetection>,
}

/// Why a reply body could not be turned into a [`DetectionResponse`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReplyError {
    /// The service answered with a non-success code.
    #[error("{0}")]
    Service(String),

    /// The body is not a valid reply.
    #[error("Malformed detection reply: {0}")]
    Malformed(String),
}

/// Parse a clip-detection reply body.
pub fn parse_clip_reply(text: &str) -> Result<DetectionResponse, ReplyError> {
    let result: ClipResult = open_envelope(text)?;
    let counts = class_counts(result.detections)?;
    Ok(DetectionResponse {
        counts,
        result: Some(ResultReference {
            play_url: result.video_play_url,
            local_path: result.video_local_path,
            dimensions: VideoDimensions::from_parts(result.video_width, result.video_height),
        }),
    })
}

/// Parse a frame-detection reply body.
pub fn parse_frame_reply(text: &str) -> Result<DetectionResponse, ReplyError> {
    let result: FrameResult = open_envelope(text)?;
    Ok(DetectionResponse {
        counts: class_counts(result.detections)?,
        result: None,
    })
}

/// Check the envelope code and decode the endpoint payload.
fn open_envelope<T: serde::de::DeserializeOwned>(text: &str) -> Result<T, ReplyError> {
    let envelope: Envelope =
        serde_json::from_str(text).map_err(|e| ReplyError::Malformed(e.to_string()))?;

    if envelope.code != CODE_SUCCESS {
        let msg = envelope
            .msg
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| format!("service returned code {}", envelope.code));
        return Err(ReplyError::Service(msg));
    }

    let payload = envelope
        .result
        .ok_or_else(|| ReplyError::Malformed("success reply without result".to_string()))?;
    serde_json::from_value(payload).map_err(|e| ReplyError::Malformed(e.to_string()))
}

/// Convert wire detections, rejecting implausible sighting totals.
fn class_counts(detections: Vec<WireDetection>) -> Result<Vec<ClassCount>, ReplyError> {
    let total: u64 = detections.iter().map(|d| u64::from(d.count)).sum();
    if total > MAX_SIGHTINGS {
        return Err(ReplyError::Malformed(format!(
            "{total} sightings exceeds the limit of {MAX_SIGHTINGS}"
        )));
    }
    Ok(detections.into_iter().map(ClassCount::from).collect())
}

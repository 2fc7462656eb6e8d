//! HTTP client for the detection service endpoints.
//!
//! Uploads clips and frames as multipart forms using [`reqwest`] and
//! decodes the JSON envelope with [`crate::messages`].

use std::time::Duration;

use bytes::Bytes;
use oceaneye_core::media::MediaBlob;
use reqwest::multipart::{Form, Part};
use url::Url;

use crate::messages::{self, ReplyError};
use crate::service::DetectionResponse;

/// Multipart field carrying the uploaded video.
pub const CLIP_FIELD: &str = "video_file";

/// Multipart field carrying the uploaded still frame.
pub const FRAME_FIELD: &str = "image_file";

/// Default clip endpoint path.
pub const DEFAULT_CLIP_PATH: &str = "/DETECT_FISH_VIDEO";

/// Default frame endpoint path.
pub const DEFAULT_FRAME_PATH: &str = "/DETECT_FISH_IMAGE";

/// Resolved endpoint URLs of one detection service.
#[derive(Debug, Clone)]
pub struct DetectorEndpoints {
    origin: Url,
    clip_url: Url,
    frame_url: Url,
}

impl DetectorEndpoints {
    /// Resolve the endpoint paths against the service origin.
    pub fn new(origin: Url, clip_path: &str, frame_path: &str) -> Result<Self, url::ParseError> {
        let clip_url = origin.join(clip_path)?;
        let frame_url = origin.join(frame_path)?;
        Ok(Self {
            origin,
            clip_url,
            frame_url,
        })
    }

    /// Endpoints at the default paths.
    pub fn with_default_paths(origin: Url) -> Result<Self, url::ParseError> {
        Self::new(origin, DEFAULT_CLIP_PATH, DEFAULT_FRAME_PATH)
    }

    /// Origin that relative result URLs are resolved against.
    pub fn origin(&self) -> &Url {
        &self.origin
    }

    pub fn clip_url(&self) -> &Url {
        &self.clip_url
    }

    pub fn frame_url(&self) -> &Url {
        &self.frame_url
    }
}

/// HTTP client for a single detection service.
pub struct DetectorApi {
    client: reqwest::Client,
    endpoints: DetectorEndpoints,
    timeout: Option<Duration>,
}

/// Errors from the detection service client.
#[derive(Debug, thiserror::Error)]
pub enum DetectorApiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service returned a non-2xx status code.
    #[error("Detection service error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The service answered but reported a failed detection.
    #[error("Detection failed: {0}")]
    Service(String),

    /// The reply body could not be decoded.
    #[error("Malformed detection reply: {0}")]
    Malformed(String),
}

impl From<ReplyError> for DetectorApiError {
    fn from(e: ReplyError) -> Self {
        match e {
            ReplyError::Service(msg) => DetectorApiError::Service(msg),
            ReplyError::Malformed(msg) => DetectorApiError::Malformed(msg),
        }
    }
}

impl DetectorApi {
    /// Create a client for the given endpoints.
    pub fn new(endpoints: DetectorEndpoints) -> Self {
        Self::with_client(reqwest::Client::new(), endpoints)
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, endpoints: DetectorEndpoints) -> Self {
        Self {
            client,
            endpoints,
            timeout: None,
        }
    }

    /// Apply a per-request timeout. Clip analysis runs the model over every
    /// frame, so this should be generous.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn endpoints(&self) -> &DetectorEndpoints {
        &self.endpoints
    }

    /// Upload a video clip under [`CLIP_FIELD`] and decode the reply.
    pub async fn detect_clip(&self, clip: &MediaBlob) -> Result<DetectionResponse, DetectorApiError> {
        tracing::debug!(
            url = %self.endpoints.clip_url,
            file_name = clip.file_name(),
            bytes = clip.len(),
            "Uploading clip for detection",
        );
        let text = self
            .upload(self.endpoints.clip_url.clone(), CLIP_FIELD, clip)
            .await?;
        Ok(messages::parse_clip_reply(&text)?)
    }

    /// Upload a still frame under [`FRAME_FIELD`] and decode the reply.
    pub async fn detect_frame(&self, frame: &MediaBlob) -> Result<DetectionResponse, DetectorApiError> {
        let text = self
            .upload(self.endpoints.frame_url.clone(), FRAME_FIELD, frame)
            .await?;
        Ok(messages::parse_frame_reply(&text)?)
    }

    // ---- private helpers ----

    /// POST one blob as a single-part multipart form and return the body.
    async fn upload(
        &self,
        url: Url,
        field: &'static str,
        blob: &MediaBlob,
    ) -> Result<String, DetectorApiError> {
        let part = Part::stream_with_length(upload_body(blob), blob.len() as u64)
            .file_name(blob.file_name().to_string())
            .mime_str(blob.mime())?;
        let form = Form::new().part(field, part);

        let mut request = self.client.post(url).multipart(form);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = Self::ensure_success(request.send().await?).await?;
        Ok(response.text().await?)
    }

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a [`DetectorApiError::ApiError`]
    /// containing the status and body text on failure.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, DetectorApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(DetectorApiError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

/// Request body backed by the blob's own buffer.
fn upload_body(blob: &MediaBlob) -> Bytes {
    Bytes::from_owner(blob.shared_bytes())
}

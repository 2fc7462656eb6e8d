//! The detection-service seam used by the session layer.

use async_trait::async_trait;
use oceaneye_core::detection::ClassCount;
use oceaneye_core::media::MediaBlob;
use oceaneye_core::presentation::ResultReference;

use crate::api::{DetectorApi, DetectorApiError};

/// Settled result of one detection request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DetectionResponse {
    /// Per-class sighting counts.
    pub counts: Vec<ClassCount>,
    /// Annotated video; only clip detection produces one.
    pub result: Option<ResultReference>,
}

impl DetectionResponse {
    /// Total number of sightings across classes.
    pub fn sighting_count(&self) -> u64 {
        self.counts.iter().map(|c| u64::from(c.count)).sum()
    }
}

/// Something that can run detection on clips and frames.
#[async_trait]
pub trait DetectionService: Send + Sync {
    /// Analyse a whole video clip.
    async fn detect_clip(&self, clip: &MediaBlob) -> Result<DetectionResponse, DetectorApiError>;

    /// Analyse a single still frame.
    async fn detect_frame(&self, frame: &MediaBlob) -> Result<DetectionResponse, DetectorApiError>;
}

#[async_trait]
impl DetectionService for DetectorApi {
    async fn detect_clip(&self, clip: &MediaBlob) -> Result<DetectionResponse, DetectorApiError> {
        DetectorApi::detect_clip(self, clip).await
    }

    async fn detect_frame(&self, frame: &MediaBlob) -> Result<DetectionResponse, DetectorApiError> {
        DetectorApi::detect_frame(self, frame).await
    }
}

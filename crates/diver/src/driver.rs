//! Runs one dive end to end.
//!
//! 1. Enter the detection screen.
//! 2. Submit the configured video file, if any.
//! 3. Sample frames live from the configured directory, if any.
//! 4. Capture the result view, end the dive and return the report.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use oceaneye_core::knowledge::Language;
use oceaneye_core::media::MediaBlob;
use oceaneye_core::navigation::AppMode;
use oceaneye_core::presentation::ResultView;
use oceaneye_core::report::{DiveReport, DiveSummary};
use oceaneye_detector::service::DetectionService;
use oceaneye_session::capture::InputSource;
use oceaneye_session::error::SessionError;
use oceaneye_session::session::DiveSession;
use serde::Serialize;

use crate::camera::DirectoryCamera;
use crate::config::DiveConfig;

#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("Failed to read {path}: {source}")]
    ReadVideo {
        path: String,
        source: std::io::Error,
    },

    #[error(transparent)]
    Session(#[from] SessionError),
}

/// What a dive produced.
#[derive(Debug, Clone, Serialize)]
pub struct DiveOutcome {
    /// Result screen as it stood when the dive ended.
    pub view: Option<ResultView>,
    pub summary: DiveSummary,
    #[serde(skip)]
    pub report: DiveReport,
}

/// Guess a MIME type from a video file extension.
pub fn video_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "mp4" | "m4v" => "video/mp4",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        "avi" => "video/x-msvideo",
        "mkv" => "video/x-matroska",
        _ => "application/octet-stream",
    }
}

/// Run a dive against `service`.
pub async fn run(
    config: &DiveConfig,
    service: Arc<dyn DetectionService>,
    language: Language,
) -> Result<DiveOutcome, DriverError> {
    // Only opened when a frames directory is configured.
    let camera = Arc::new(DirectoryCamera::new(config.frames_dir.clone().unwrap_or_default()));
    let session = DiveSession::new(config.session.clone(), camera, service);

    let outcome = dive(&session, config, language).await;
    session.shutdown().await;
    outcome
}

async fn dive(session: &DiveSession, config: &DiveConfig, language: Language) -> Result<DiveOutcome, DriverError> {
    session.navigate(AppMode::Detecting).await;

    if let Some(path) = &config.video_file {
        let bytes = tokio::fs::read(path).await.map_err(|source| DriverError::ReadVideo {
            path: path.display().to_string(),
            source,
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "video.mp4".to_string());

        session.set_source(InputSource::File).await;
        session
            .select_file(&name, MediaBlob::new(bytes, video_mime(path), name.clone()))
            .await?;
        let response = session.submit().await?;
        tracing::info!(
            file_name = %name,
            sightings = response.sighting_count(),
            "Clip analysed",
        );
    }

    if config.frames_dir.is_some() {
        live_dive(session, config.live_duration).await?;
    }

    let view = match session.result_view(language).await {
        Ok(view) => Some(view),
        Err(e) => {
            tracing::warn!(error = %e, "Result is not playable");
            None
        }
    };

    let report = session.end_dive().await;
    let summary = report.summary(language);
    tracing::info!(
        total_sightings = summary.total_sightings,
        toxic_sightings = summary.toxic_sightings,
        species_count = summary.species_count,
        "Dive report ready",
    );

    Ok(DiveOutcome { view, summary, report })
}

async fn live_dive(session: &DiveSession, duration: Duration) -> Result<(), DriverError> {
    session.open_camera().await?;
    session.set_live(true).await;
    tracing::info!(duration_secs = duration.as_secs(), "Live sampling dive started");

    tokio::time::sleep(duration).await;

    session.set_live(false).await;
    session.close_camera().await;
    Ok(())
}

//! Diver configuration loaded from the environment.

use std::path::PathBuf;
use std::time::Duration;

use oceaneye_session::config::{ConfigError, SessionConfig};

/// Default length of a live-sampling dive.
pub const DEFAULT_LIVE_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct DiveConfig {
    pub session: SessionConfig,
    /// Video to submit as a one-shot clip.
    pub video_file: Option<PathBuf>,
    /// Directory of still frames to sample live.
    pub frames_dir: Option<PathBuf>,
    /// How long to keep live sampling running.
    pub live_duration: Duration,
}

#[derive(Debug, thiserror::Error)]
pub enum DiveConfigError {
    #[error(transparent)]
    Session(#[from] ConfigError),

    #[error("DIVE_LIVE_SECS must be a positive integer (got '{0}')")]
    InvalidLiveSecs(String),

    #[error("Set DIVE_VIDEO_FILE and/or DIVE_FRAMES_DIR")]
    NothingToDo,
}

impl DiveConfig {
    /// Load configuration from environment variables.
    ///
    /// Session variables are documented on [`SessionConfig::from_env`].
    ///
    /// | Env Var           | Default |
    /// |-------------------|---------|
    /// | `DIVE_VIDEO_FILE` | --      |
    /// | `DIVE_FRAMES_DIR` | --      |
    /// | `DIVE_LIVE_SECS`  | `10`    |
    ///
    /// At least one of `DIVE_VIDEO_FILE` and `DIVE_FRAMES_DIR` is required.
    pub fn from_env() -> Result<Self, DiveConfigError> {
        let session = SessionConfig::from_env()?;

        let video_file = non_empty_var("DIVE_VIDEO_FILE").map(PathBuf::from);
        let frames_dir = non_empty_var("DIVE_FRAMES_DIR").map(PathBuf::from);
        if video_file.is_none() && frames_dir.is_none() {
            return Err(DiveConfigError::NothingToDo);
        }

        let live_secs = match non_empty_var("DIVE_LIVE_SECS") {
            Some(raw) => parse_live_secs(&raw)?,
            None => DEFAULT_LIVE_SECS,
        };

        Ok(Self {
            session,
            video_file,
            frames_dir,
            live_duration: Duration::from_secs(live_secs),
        })
    }
}

fn non_empty_var(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.trim().is_empty())
}

fn parse_live_secs(raw: &str) -> Result<u64, DiveConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(DiveConfigError::InvalidLiveSecs(raw.to_string())),
    }
}

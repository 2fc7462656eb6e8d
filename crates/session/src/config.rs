use std::time::Duration;

use oceaneye_detector::api::{DetectorEndpoints, DEFAULT_CLIP_PATH, DEFAULT_FRAME_PATH};
use url::Url;

use crate::device::{Facing, StreamRequest};

/// Default detection service origin.
pub const DEFAULT_DETECTOR_ORIGIN: &str = "http://localhost:5000";

/// Default live-sampling period.
pub const DEFAULT_LIVE_INTERVAL_MS: u64 = 2000;

/// Default per-request timeout for the detection service.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Session configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Service origin; relative result URLs resolve against it.
    pub detector_origin: Url,
    /// Clip endpoint path.
    pub clip_path: String,
    /// Frame endpoint path.
    pub frame_path: String,
    /// Per-request timeout for detection calls.
    pub request_timeout: Duration,
    /// Period between live-sampling ticks.
    pub live_interval: Duration,
    /// Camera constraints used by `open_camera`.
    pub camera: StreamRequest,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be a valid URL: {source}")]
    InvalidUrl {
        var: &'static str,
        source: url::ParseError,
    },

    #[error("{var} must be a positive integer (got '{value}')")]
    InvalidNumber { var: &'static str, value: String },
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            detector_origin: Url::parse(DEFAULT_DETECTOR_ORIGIN)
                .expect("DEFAULT_DETECTOR_ORIGIN is a valid URL"),
            clip_path: DEFAULT_CLIP_PATH.to_string(),
            frame_path: DEFAULT_FRAME_PATH.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            live_interval: Duration::from_millis(DEFAULT_LIVE_INTERVAL_MS),
            camera: StreamRequest::default(),
        }
    }
}

impl SessionConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                  |
    /// |-------------------------|--------------------------|
    /// | `DETECTOR_ORIGIN`       | `http://localhost:5000`  |
    /// | `DETECTOR_CLIP_PATH`    | `/DETECT_FISH_VIDEO`     |
    /// | `DETECTOR_FRAME_PATH`   | `/DETECT_FISH_IMAGE`     |
    /// | `DETECTOR_TIMEOUT_SECS` | `300`                    |
    /// | `LIVE_INTERVAL_MS`      | `2000`                   |
    /// | `CAMERA_IDEAL_WIDTH`    | `720`                    |
    /// | `CAMERA_IDEAL_HEIGHT`   | `1080`                   |
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let detector_origin = match std::env::var("DETECTOR_ORIGIN") {
            Ok(raw) => Url::parse(raw.trim()).map_err(|source| ConfigError::InvalidUrl {
                var: "DETECTOR_ORIGIN",
                source,
            })?,
            Err(_) => defaults.detector_origin,
        };

        let clip_path = std::env::var("DETECTOR_CLIP_PATH").unwrap_or(defaults.clip_path);
        let frame_path = std::env::var("DETECTOR_FRAME_PATH").unwrap_or(defaults.frame_path);

        let request_timeout = Duration::from_secs(positive_var(
            "DETECTOR_TIMEOUT_SECS",
            DEFAULT_TIMEOUT_SECS,
        )?);
        let live_interval = Duration::from_millis(positive_var(
            "LIVE_INTERVAL_MS",
            DEFAULT_LIVE_INTERVAL_MS,
        )?);

        let camera = StreamRequest {
            facing: Facing::Environment,
            ideal_width: positive_var("CAMERA_IDEAL_WIDTH", u64::from(defaults.camera.ideal_width))?
                as u32,
            ideal_height: positive_var(
                "CAMERA_IDEAL_HEIGHT",
                u64::from(defaults.camera.ideal_height),
            )? as u32,
        };

        Ok(Self {
            detector_origin,
            clip_path,
            frame_path,
            request_timeout,
            live_interval,
            camera,
        })
    }

    /// Resolved detector endpoints.
    pub fn detector_endpoints(&self) -> Result<DetectorEndpoints, ConfigError> {
        DetectorEndpoints::new(self.detector_origin.clone(), &self.clip_path, &self.frame_path)
            .map_err(|source| ConfigError::InvalidUrl {
                var: "DETECTOR_CLIP_PATH/DETECTOR_FRAME_PATH",
                source,
            })
    }
}

/// Read a positive integer variable, falling back to `default` when unset.
fn positive_var(var: &'static str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(var) {
        Ok(value) => parse_positive(var, &value),
        Err(_) => Ok(default),
    }
}

fn parse_positive(var: &'static str, value: &str) -> Result<u64, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(n) if n > 0 && n <= u64::from(u32::MAX) => Ok(n),
        _ => Err(ConfigError::InvalidNumber {
            var,
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_service_contract() {
        let config = SessionConfig::default();
        assert_eq!(config.live_interval, Duration::from_millis(2000));
        assert_eq!(config.camera.ideal_width, 720);
        assert_eq!(config.camera.ideal_height, 1080);
        assert_eq!(config.camera.facing, Facing::Environment);

        let endpoints = config.detector_endpoints().unwrap();
        assert_eq!(endpoints.clip_url().path(), "/DETECT_FISH_VIDEO");
        assert_eq!(endpoints.frame_url().path(), "/DETECT_FISH_IMAGE");
    }

    #[test]
    fn positive_numbers_only() {
        assert_eq!(parse_positive("X", " 1500 ").unwrap(), 1500);
        assert!(parse_positive("X", "0").is_err());
        assert!(parse_positive("X", "-4").is_err());
        assert!(parse_positive("X", "two").is_err());
        assert!(parse_positive("X", "99999999999").is_err());
    }
}

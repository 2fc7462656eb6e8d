//! `oceaneye-diver` -- runs a dive against a detection service.
//!
//! Submits a video file as a one-shot clip and/or samples a directory of
//! still frames live, then prints the result view and the dive report
//! tally as JSON.
//!
//! # Environment variables
//!
//! | Variable                | Required | Default                 | Description                              |
//! |-------------------------|----------|-------------------------|------------------------------------------|
//! | `DETECTOR_ORIGIN`       | no       | `http://localhost:5000` | Detection service origin                 |
//! | `DETECTOR_CLIP_PATH`    | no       | `/DETECT_FISH_VIDEO`    | Clip endpoint path                       |
//! | `DETECTOR_FRAME_PATH`   | no       | `/DETECT_FISH_IMAGE`    | Frame endpoint path                      |
//! | `DETECTOR_TIMEOUT_SECS` | no       | `300`                   | Per-request timeout                      |
//! | `LIVE_INTERVAL_MS`      | no       | `2000`                  | Milliseconds between live ticks          |
//! | `CAMERA_IDEAL_WIDTH`    | no       | `720`                   | Requested frame width                    |
//! | `CAMERA_IDEAL_HEIGHT`   | no       | `1080`                  | Requested frame height                   |
//! | `DIVE_VIDEO_FILE`       | one of   | --                      | Video to submit                          |
//! | `DIVE_FRAMES_DIR`       | one of   | --                      | Directory of frames to sample live       |
//! | `DIVE_LIVE_SECS`        | no       | `10`                    | Length of the live-sampling dive         |

use std::sync::Arc;

use oceaneye_core::knowledge::Language;
use oceaneye_detector::api::DetectorApi;
use oceaneye_diver::config::DiveConfig;
use oceaneye_diver::driver;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "oceaneye_diver=info,oceaneye_session=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = DiveConfig::from_env().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid configuration");
        std::process::exit(1);
    });

    let endpoints = config.session.detector_endpoints().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid detector endpoints");
        std::process::exit(1);
    });

    tracing::info!(
        clip_url = %endpoints.clip_url(),
        frame_url = %endpoints.frame_url(),
        video_file = ?config.video_file,
        frames_dir = ?config.frames_dir,
        "Starting oceaneye-diver",
    );

    let api = DetectorApi::new(endpoints).with_timeout(config.session.request_timeout);

    let outcome = match driver::run(&config, Arc::new(api), Language::default()).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!(error = %e, "Dive failed");
            std::process::exit(1);
        }
    };

    match serde_json::to_string_pretty(&outcome) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize dive outcome");
            std::process::exit(1);
        }
    }
}

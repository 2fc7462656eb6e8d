//! Live frame sampling.
//!
//! While live mode is on and the camera is active, a background task
//! grabs one frame per period and sends it to the frame endpoint.
//! Sightings are appended to the log.
//!
//! Ticks never overlap: the loop waits for each tick's request before
//! it polls the timer again, and ticks missed in the meantime are
//! skipped. Cancelling the task's token drops any in-flight request
//! without touching the log.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use oceaneye_detector::api::DetectorApiError;
use oceaneye_detector::service::DetectionService;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::device::{CameraStream, DeviceError};
use crate::events::SessionEvent;
use crate::orchestrator::{DetectionState, LiveApply};

/// A failed live tick. Logged and otherwise ignored.
#[derive(Debug, thiserror::Error)]
pub enum LiveTickFailure {
    #[error("frame capture failed: {0}")]
    Device(#[from] DeviceError),

    #[error("frame detection failed: {0}")]
    Detection(#[from] DetectorApiError),
}

/// What one tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Appended { added: usize, total: usize },
    /// No frame yet, a one-shot in flight, or a stale result.
    Skipped,
}

/// Everything a live task needs, detached from the session locks.
#[derive(Clone)]
pub struct LiveContext {
    pub stream: Arc<dyn CameraStream>,
    pub service: Arc<dyn DetectionService>,
    pub state: Arc<Mutex<DetectionState>>,
    pub events: broadcast::Sender<SessionEvent>,
    pub period: Duration,
}

/// Handle to a running live-sampling task.
///
/// Dropping the handle cancels the task.
pub struct LiveTask {
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl LiveTask {
    pub fn spawn(ctx: LiveContext) -> Self {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let handle = tokio::spawn(async move { run(ctx, token).await });
        Self {
            cancel,
            handle: Some(handle),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }

    /// Cancel the task and wait until it has exited. Once this returns
    /// no tick can write to the log.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                if e.is_panic() {
                    tracing::error!(error = %e, "Live sampling task panicked");
                }
            }
        }
    }
}

impl Drop for LiveTask {
    fn drop(&mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

async fn run(ctx: LiveContext, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval_at(Instant::now() + ctx.period, ctx.period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tracing::info!(period_ms = ctx.period.as_millis() as u64, "Live sampling started");
    let _ = ctx.events.send(SessionEvent::LiveStarted);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            outcome = live_tick(&ctx) => outcome,
        };

        match outcome {
            Ok(TickOutcome::Appended { added, total }) => {
                tracing::debug!(added, total, "Live sightings appended");
                let _ = ctx.events.send(SessionEvent::DetectionsAppended { added, total });
            }
            Ok(TickOutcome::Skipped) => {}
            Err(e) => tracing::warn!(error = %e, "Live tick failed"),
        }
    }

    tracing::info!("Live sampling stopped");
    let _ = ctx.events.send(SessionEvent::LiveStopped);
}

/// Grab one frame, detect and append.
pub async fn live_tick(ctx: &LiveContext) -> Result<TickOutcome, LiveTickFailure> {
    let epoch = {
        let state = ctx.state.lock().await;
        if state.is_submitting() {
            return Ok(TickOutcome::Skipped);
        }
        state.log.epoch()
    };

    let Some(frame) = ctx.stream.grab_frame().await? else {
        tracing::trace!("Frame not ready, tick skipped");
        return Ok(TickOutcome::Skipped);
    };

    let response = ctx.service.detect_frame(&frame).await?;

    let applied = ctx.state.lock().await.apply_live(epoch, &response, Utc::now());
    Ok(match applied {
        LiveApply::Appended { added, total } => TickOutcome::Appended { added, total },
        LiveApply::Stale => {
            tracing::debug!(epoch, "Stale live result dropped");
            TickOutcome::Skipped
        }
    })
}

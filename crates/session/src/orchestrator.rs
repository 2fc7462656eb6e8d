//! Detection orchestrator.
//!
//! Runs one-shot submissions (`Idle -> Submitting -> Idle`, via
//! [`DetectionOrchestrator::begin`] then [`DetectionOrchestrator::run`]) and applies
//! live-sampling results to the shared [`DetectionState`].
//!
//! Arbitration between the two write paths uses the log epoch:
//!
//! - a one-shot submission bumps the epoch when it starts and only
//!   applies its result if the epoch is unchanged when it settles;
//! - a live tick records the epoch before grabbing a frame and its
//!   result is dropped if the epoch moved or a one-shot is in flight.
//!
//! The state lock is never held across a detection request.

use std::sync::Arc;

use chrono::Utc;
use oceaneye_core::detection::{expand_counts, DetectionLog};
use oceaneye_core::media::PendingInput;
use oceaneye_core::presentation::ResultReference;
use oceaneye_core::types::Timestamp;
use oceaneye_detector::service::{DetectionResponse, DetectionService};
use tokio::sync::{broadcast, Mutex};

use crate::error::SessionError;
use crate::events::SessionEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmitPhase {
    #[default]
    Idle,
    Submitting,
}

/// Detection-side session state.
#[derive(Debug, Default)]
pub struct DetectionState {
    pub log: DetectionLog,
    pub result: Option<ResultReference>,
    /// Message shown on the error indicator.
    pub error: Option<String>,
    pub phase: SubmitPhase,
}

/// What happened to a live tick's response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiveApply {
    Appended { added: usize, total: usize },
    /// A one-shot submission is running or the log moved on.
    Stale,
}

impl DetectionState {
    pub fn is_submitting(&self) -> bool {
        self.phase == SubmitPhase::Submitting
    }

    /// Enter `Submitting` and return the epoch the submission runs under.
    pub fn begin_submission(&mut self) -> Result<u64, SessionError> {
        if self.is_submitting() {
            return Err(SessionError::SubmissionInFlight);
        }
        self.phase = SubmitPhase::Submitting;
        self.error = None;
        Ok(self.log.advance_epoch())
    }

    /// Settle a successful submission. Returns `false` when the session
    /// was reset while the request was out, in which case nothing changes.
    pub fn finish_success(&mut self, epoch: u64, response: &DetectionResponse, now: Timestamp) -> bool {
        self.phase = SubmitPhase::Idle;
        if self.log.epoch() != epoch {
            return false;
        }
        self.log.replace(expand_counts(&response.counts, now));
        self.result = response.result.clone();
        self.error = None;
        true
    }

    /// Settle a failed submission; log and result stay as they were.
    pub fn finish_failure(&mut self, error: &SessionError) {
        self.phase = SubmitPhase::Idle;
        self.surface(error);
    }

    /// Append a live tick's sightings unless they are stale.
    pub fn apply_live(&mut self, epoch: u64, response: &DetectionResponse, now: Timestamp) -> LiveApply {
        if self.is_submitting() || self.log.epoch() != epoch {
            return LiveApply::Stale;
        }
        let records = expand_counts(&response.counts, now);
        let added = records.len();
        self.log.append(records);
        LiveApply::Appended {
            added,
            total: self.log.len(),
        }
    }

    pub fn surface(&mut self, error: &SessionError) {
        if error.is_surfaced() {
            self.error = Some(error.to_string());
        }
    }

    /// Clear log, result and error. An in-flight submission keeps its
    /// phase but its result will no longer apply.
    pub fn reset(&mut self) {
        self.log.clear();
        self.result = None;
        self.error = None;
    }
}

/// Drives one-shot submissions against a [`DetectionService`].
#[derive(Clone)]
pub struct DetectionOrchestrator {
    service: Arc<dyn DetectionService>,
    state: Arc<Mutex<DetectionState>>,
    events: broadcast::Sender<SessionEvent>,
}

impl DetectionOrchestrator {
    pub fn new(service: Arc<dyn DetectionService>, events: broadcast::Sender<SessionEvent>) -> Self {
        Self {
            service,
            state: Arc::new(Mutex::new(DetectionState::default())),
            events,
        }
    }

    pub fn service(&self) -> &Arc<dyn DetectionService> {
        &self.service
    }

    pub fn state(&self) -> &Arc<Mutex<DetectionState>> {
        &self.state
    }

    pub async fn is_submitting(&self) -> bool {
        self.state.lock().await.is_submitting()
    }

    /// Put `error` on the error indicator (if it is a surfaced kind).
    pub async fn surface(&self, error: &SessionError) {
        self.state.lock().await.surface(error);
    }

    pub async fn clear_error(&self) {
        self.state.lock().await.error = None;
    }

    /// Enter `Submitting` and return the epoch the submission runs under.
    ///
    /// Call this while still holding the lock that guards the input, so
    /// the input cannot change or be reset before the slot is claimed.
    /// Then release that lock and call [`Self::run`].
    pub async fn begin(&self) -> Result<u64, SessionError> {
        self.state.lock().await.begin_submission()
    }

    /// Send `input` to the matching endpoint and settle the outcome of a
    /// submission started by [`Self::begin`].
    ///
    /// Clips replace the log; a frame submitted this way replaces it too,
    /// since one-shot results are authoritative.
    pub async fn run(&self, epoch: u64, input: PendingInput) -> Result<DetectionResponse, SessionError> {
        let kind = input.kind();
        let bytes = input.blob().len();
        tracing::info!(kind, bytes, epoch, "Submitting media for detection");
        let _ = self.events.send(SessionEvent::SubmissionStarted { kind });

        let outcome = if input.is_clip() {
            self.service.detect_clip(input.blob()).await
        } else {
            self.service.detect_frame(input.blob()).await
        };

        match outcome {
            Ok(response) => {
                let (applied, total) = {
                    let mut state = self.state.lock().await;
                    let applied = state.finish_success(epoch, &response, Utc::now());
                    (applied, state.log.len())
                };

                if applied {
                    tracing::info!(
                        kind,
                        classes = response.counts.len(),
                        sightings = response.sighting_count(),
                        "Detection completed",
                    );
                    let _ = self.events.send(SessionEvent::DetectionsReplaced { total });
                } else {
                    tracing::debug!(kind, "Detection result dropped, session was reset");
                }
                Ok(response)
            }
            Err(e) => {
                let error = SessionError::from(e);
                match &error {
                    SessionError::Transport(detail) => {
                        tracing::error!(kind, error = %detail, "Detection request failed")
                    }
                    other => tracing::warn!(kind, error = %other, "Detection service rejected media"),
                }
                self.state.lock().await.finish_failure(&error);
                let _ = self.events.send(SessionEvent::SubmissionFailed {
                    message: error.to_string(),
                });
                Err(error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use oceaneye_core::detection::ClassCount;

    use super::*;

    fn response(class_id: u32, count: u32, is_toxic: bool) -> DetectionResponse {
        DetectionResponse {
            counts: vec![ClassCount {
                class_id,
                count,
                is_toxic,
            }],
            result: None,
        }
    }

    #[test]
    fn second_begin_is_rejected() {
        let mut state = DetectionState::default();
        state.begin_submission().unwrap();
        assert_matches!(state.begin_submission(), Err(SessionError::SubmissionInFlight));
    }

    #[test]
    fn success_replaces_log() {
        let mut state = DetectionState::default();
        let epoch = state.begin_submission().unwrap();
        state.log.append(expand_counts(&response(9, 4, false).counts, Utc::now()));

        assert!(state.finish_success(epoch, &response(3, 2, true), Utc::now()));
        assert_eq!(state.log.len(), 2);
        assert!(state.log.records().iter().all(|r| r.class_id == 3 && r.is_toxic));
        assert_eq!(state.phase, SubmitPhase::Idle);
    }

    #[test]
    fn reset_mid_flight_discards_the_result() {
        let mut state = DetectionState::default();
        let epoch = state.begin_submission().unwrap();
        state.reset();

        assert!(!state.finish_success(epoch, &response(3, 2, true), Utc::now()));
        assert!(state.log.is_empty());
        assert!(!state.is_submitting());
    }

    #[test]
    fn live_results_are_dropped_while_submitting_or_stale() {
        let mut state = DetectionState::default();
        let live_epoch = state.log.epoch();

        let epoch = state.begin_submission().unwrap();
        assert_eq!(state.apply_live(epoch, &response(5, 1, false), Utc::now()), LiveApply::Stale);

        state.finish_success(epoch, &response(3, 1, true), Utc::now());
        assert_eq!(
            state.apply_live(live_epoch, &response(5, 1, false), Utc::now()),
            LiveApply::Stale
        );

        let current = state.log.epoch();
        assert_eq!(
            state.apply_live(current, &response(5, 1, false), Utc::now()),
            LiveApply::Appended { added: 1, total: 2 }
        );
    }

    #[test]
    fn failure_keeps_log_and_surfaces_message() {
        let mut state = DetectionState::default();
        let epoch = state.begin_submission().unwrap();
        state.finish_success(epoch, &response(1, 3, true), Utc::now());

        state.begin_submission().unwrap();
        state.finish_failure(&SessionError::Service("bad video".into()));
        assert_eq!(state.log.len(), 3);
        assert!(state.error.as_deref().unwrap().contains("bad video"));
    }
}

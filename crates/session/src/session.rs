//! The dive session context.
//!
//! [`DiveSession`] ties capture, detection, live sampling and navigation
//! together. Locks are always taken in the order
//! navigator -> capture -> live -> detection state, and none of them is
//! held across a detection request.

use std::sync::Arc;

use chrono::Utc;
use oceaneye_core::detection::DetectionRecord;
use oceaneye_core::error::CoreError;
use oceaneye_core::knowledge::Language;
use oceaneye_core::media::MediaBlob;
use oceaneye_core::navigation::{AppMode, Navigator, Transition};
use oceaneye_core::presentation::{self, ResultReference, ResultView};
use oceaneye_core::report::DiveReport;
use oceaneye_detector::service::{DetectionResponse, DetectionService};
use tokio::sync::{broadcast, Mutex};

use crate::capture::{CaptureState, InputSource, MediaCaptureController, RecordingToggle};
use crate::config::SessionConfig;
use crate::device::CameraDevice;
use crate::error::SessionError;
use crate::events::{SessionEvent, EVENT_CHANNEL_CAPACITY};
use crate::live::{LiveContext, LiveTask};
use crate::orchestrator::DetectionOrchestrator;

/// Live-sampling flag plus the task it implies.
#[derive(Default)]
struct LiveSampling {
    enabled: bool,
    task: Option<LiveTask>,
}

/// One diver's capture and detection session.
///
/// Dropping the session cancels live sampling and closes the camera.
pub struct DiveSession {
    config: SessionConfig,
    navigator: Mutex<Navigator>,
    // Declared before `capture` so the live task is torn down before
    // the stream it samples.
    live: Mutex<LiveSampling>,
    capture: Mutex<MediaCaptureController>,
    orchestrator: DetectionOrchestrator,
    last_report: Mutex<Option<DiveReport>>,
    events: broadcast::Sender<SessionEvent>,
}

impl DiveSession {
    pub fn new(config: SessionConfig, camera: Arc<dyn CameraDevice>, service: Arc<dyn DetectionService>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let capture = MediaCaptureController::new(camera, config.camera);
        Self {
            orchestrator: DetectionOrchestrator::new(service, events.clone()),
            navigator: Mutex::new(Navigator::new()),
            live: Mutex::new(LiveSampling::default()),
            capture: Mutex::new(capture),
            last_report: Mutex::new(None),
            events,
            config,
        }
    }

    /// Subscribe to session events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    // ---- capture ----

    /// Open the rear camera. A failure is surfaced and leaves the camera
    /// inactive.
    pub async fn open_camera(&self) -> Result<(), SessionError> {
        let mut capture = self.capture.lock().await;
        match capture.open_camera().await {
            Ok(true) => {
                self.orchestrator.clear_error().await;
                let _ = self.events.send(SessionEvent::CameraOpened);
            }
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(error = %e, "Camera unavailable");
                let error = SessionError::CameraUnavailable(e.to_string());
                self.orchestrator.surface(&error).await;
                return Err(error);
            }
        }
        self.reconcile_live(&capture).await;
        Ok(())
    }

    /// Cancel live sampling, abort any recording and stop the camera.
    pub async fn close_camera(&self) {
        let mut capture = self.capture.lock().await;
        self.release_media(&mut capture).await;
    }

    /// Start or finish a recording. Ignored while a one-shot submission
    /// is in flight or the camera is off.
    pub async fn toggle_recording(&self) -> Result<RecordingToggle, SessionError> {
        // Checked under the capture lock: `submit` claims the slot while
        // holding it.
        let mut capture = self.capture.lock().await;
        if self.orchestrator.is_submitting().await {
            return Ok(RecordingToggle::Ignored);
        }

        match capture.toggle_recording().await {
            Ok(toggle) => {
                match toggle {
                    RecordingToggle::Started => {
                        let _ = self.events.send(SessionEvent::RecordingStarted);
                    }
                    RecordingToggle::Finished { bytes } => {
                        let _ = self.events.send(SessionEvent::RecordingFinished { bytes });
                    }
                    RecordingToggle::Ignored => {}
                }
                Ok(toggle)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Recording failed");
                let error = SessionError::from(e);
                self.orchestrator.surface(&error).await;
                Err(error)
            }
        }
    }

    /// Pick a video file as upload input.
    pub async fn select_file(&self, name: &str, blob: MediaBlob) -> Result<(), SessionError> {
        let mut capture = self.capture.lock().await;
        if let Err(error) = capture.select_file(name, blob) {
            self.orchestrator.surface(&error).await;
            return Err(error);
        }

        {
            let mut state = self.orchestrator.state().lock().await;
            state.result = None;
            state.error = None;
        }
        let _ = self.events.send(SessionEvent::FileSelected {
            name: name.to_string(),
        });
        Ok(())
    }

    pub async fn set_source(&self, source: InputSource) {
        self.capture.lock().await.set_source(source);
    }

    pub async fn capture_state(&self) -> CaptureState {
        self.capture.lock().await.state()
    }

    // ---- detection ----

    /// Submit the pending input for one-shot detection.
    ///
    /// The input is read and the submission slot claimed under one hold
    /// of the capture lock, so no recording toggle or reset can slip in
    /// between. The lock is released before the request goes out.
    pub async fn submit(&self) -> Result<DetectionResponse, SessionError> {
        let (epoch, input) = {
            let capture = self.capture.lock().await;
            if self.orchestrator.is_submitting().await {
                return Err(SessionError::SubmissionInFlight);
            }
            let input = match capture.pending_input() {
                Ok(input) => input,
                Err(error) => {
                    self.orchestrator.surface(&error).await;
                    return Err(error);
                }
            };
            (self.orchestrator.begin().await?, input)
        };

        self.orchestrator.run(epoch, input).await
    }

    /// Turn live sampling on or off. Sampling only runs while the camera
    /// is active as well.
    pub async fn set_live(&self, enabled: bool) {
        let capture = self.capture.lock().await;
        self.live.lock().await.enabled = enabled;
        tracing::info!(enabled, camera_active = capture.is_active(), "Live sampling toggled");
        self.reconcile_live(&capture).await;
    }

    pub async fn live_enabled(&self) -> bool {
        self.live.lock().await.enabled
    }

    /// Whether a live-sampling task is currently running.
    pub async fn live_running(&self) -> bool {
        self.live
            .lock()
            .await
            .task
            .as_ref()
            .is_some_and(|t| !t.is_finished())
    }

    pub async fn is_submitting(&self) -> bool {
        self.orchestrator.is_submitting().await
    }

    pub async fn detections(&self) -> Vec<DetectionRecord> {
        self.orchestrator.state().lock().await.log.snapshot()
    }

    pub async fn result(&self) -> Option<ResultReference> {
        self.orchestrator.state().lock().await.result.clone()
    }

    pub async fn error_message(&self) -> Option<String> {
        self.orchestrator.state().lock().await.error.clone()
    }

    /// Render-ready result screen for the current log and result.
    pub async fn result_view(&self, language: Language) -> Result<ResultView, CoreError> {
        let state = self.orchestrator.state().lock().await;
        presentation::result_view(
            state.result.as_ref(),
            state.log.records(),
            &self.config.detector_origin,
            language,
        )
    }

    // ---- navigation ----

    pub async fn mode(&self) -> AppMode {
        self.navigator.lock().await.current()
    }

    /// Switch modes and perform the teardown the transition requires.
    pub async fn navigate(&self, to: AppMode) -> Transition {
        let mut navigator = self.navigator.lock().await;
        let mut capture = self.capture.lock().await;
        self.apply_transition(&mut navigator, &mut capture, to).await
    }

    /// Freeze the log into a report, then go to the report screen.
    ///
    /// Live sampling is stopped before the snapshot, and the locks are
    /// held through the reset, so every sighting appended before the
    /// dive ended is in the report.
    pub async fn end_dive(&self) -> DiveReport {
        let mut navigator = self.navigator.lock().await;
        let mut capture = self.capture.lock().await;
        self.release_media(&mut capture).await;

        let records = self.orchestrator.state().lock().await.log.snapshot();
        let report = DiveReport::new(records, Utc::now());
        tracing::info!(sightings = report.records.len(), "Dive ended");
        *self.last_report.lock().await = Some(report.clone());

        self.apply_transition(&mut navigator, &mut capture, AppMode::Report).await;
        report
    }

    pub async fn last_report(&self) -> Option<DiveReport> {
        self.last_report.lock().await.clone()
    }

    /// Release every resource held by the session.
    pub async fn shutdown(&self) {
        let mut capture = self.capture.lock().await;
        self.live.lock().await.enabled = false;
        self.release_media(&mut capture).await;
    }

    // ---- private helpers ----

    /// Switch modes and perform the teardown the transition requires.
    async fn apply_transition(
        &self,
        navigator: &mut Navigator,
        capture: &mut MediaCaptureController,
        to: AppMode,
    ) -> Transition {
        let transition = navigator.transition(to);
        if transition.is_noop() {
            return transition;
        }

        if transition.release_media {
            self.release_media(capture).await;
        }

        if transition.reset {
            self.live.lock().await.enabled = false;
            capture.reset();
            self.orchestrator.state().lock().await.reset();
        }

        tracing::info!(from = ?transition.from, to = ?transition.to, reset = transition.reset, "Mode changed");
        let _ = self.events.send(SessionEvent::ModeChanged {
            from: transition.from,
            to: transition.to,
            reset: transition.reset,
        });
        transition
    }

    /// Stop the live task, then close the camera.
    async fn release_media(&self, capture: &mut MediaCaptureController) {
        let task = self.live.lock().await.task.take();
        if let Some(task) = task {
            task.stop().await;
        }
        if capture.close_camera() {
            let _ = self.events.send(SessionEvent::CameraClosed);
        }
    }

    /// Start or stop the live task so that it runs exactly when live
    /// mode is on and the camera is active.
    async fn reconcile_live(&self, capture: &MediaCaptureController) {
        let mut live = self.live.lock().await;
        let stream = capture.stream().filter(|_| live.enabled);

        match (stream, live.task.is_some()) {
            (Some(stream), false) => {
                live.task = Some(LiveTask::spawn(LiveContext {
                    stream,
                    service: self.orchestrator.service().clone(),
                    state: self.orchestrator.state().clone(),
                    events: self.events.clone(),
                    period: self.config.live_interval,
                }));
            }
            (None, true) => {
                if let Some(task) = live.task.take() {
                    task.stop().await;
                }
            }
            _ => {}
        }
    }
}

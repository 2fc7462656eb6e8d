//! Capture and detection orchestration for one dive.
//!
//! [`session::DiveSession`] is the single coordinating context: it owns
//! the camera (through [`capture::MediaCaptureController`]), the
//! detection log (through [`orchestrator::DetectionOrchestrator`]), the
//! live-sampling task and the navigation mode, and serializes every
//! mutation of them. State changes are broadcast as
//! [`events::SessionEvent`]s.

pub mod capture;
pub mod config;
pub mod device;
pub mod error;
pub mod events;
pub mod live;
pub mod orchestrator;
pub mod session;

//! Domain model for the OceanEye dive detection flow.
//!
//! Everything in this crate is pure: detection records and the
//! session detection log, the bundled fish knowledge base, result
//! presentation, navigation modes and the dive report tally. Network
//! and device concerns live in `oceaneye-detector` and
//! `oceaneye-session`.

pub mod detection;
pub mod error;
pub mod knowledge;
pub mod media;
pub mod navigation;
pub mod presentation;
pub mod report;
pub mod types;

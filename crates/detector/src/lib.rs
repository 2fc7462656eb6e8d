//! Client for the remote fish detection service.
//!
//! Provides typed reply parsing, a multipart HTTP client for the clip
//! and frame endpoints, and the [`service::DetectionService`] seam the
//! session layer talks to.

pub mod api;
pub mod messages;
pub mod service;

//! Result presentation adapter.
//!
//! Turns a settled clip-detection result into the shape the result and
//! report screens render: a playable absolute URL, an aspect ratio that
//! is always usable for layout, and per-class sighting rows.

use serde::Serialize;
use url::Url;

use crate::detection::DetectionRecord;
use crate::error::CoreError;
use crate::knowledge::{self, Language};
use crate::types::ClassId;

/// Preview aspect ratio used when the service did not report dimensions
/// (portrait camera frame, 9:16).
pub const DEFAULT_ASPECT: AspectRatio = AspectRatio {
    width: 9,
    height: 16,
};

/// Width and height of the annotated result video. Both or neither.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VideoDimensions {
    pub width: u32,
    pub height: u32,
}

impl VideoDimensions {
    /// Pair up optional wire fields. A half-specified or zero-sized pair
    /// is treated as absent.
    pub fn from_parts(width: Option<u32>, height: Option<u32>) -> Option<Self> {
        match (width, height) {
            (Some(width), Some(height)) if width > 0 && height > 0 => Some(Self { width, height }),
            _ => None,
        }
    }
}

/// Playable result of a clip analysis as returned by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultReference {
    /// Absolute URL or a path relative to the service origin.
    pub play_url: String,
    /// Where the service stored the annotated video.
    pub local_path: Option<String>,
    pub dimensions: Option<VideoDimensions>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AspectRatio {
    pub width: u32,
    pub height: u32,
}

impl AspectRatio {
    /// CSS-style `w / h` string.
    pub fn css(&self) -> String {
        format!("{} / {}", self.width, self.height)
    }
}

/// Everything a video player needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerDescriptor {
    pub url: Url,
    pub aspect: AspectRatio,
    /// `true` when [`DEFAULT_ASPECT`] stands in for missing dimensions.
    pub aspect_is_fallback: bool,
    pub local_path: Option<String>,
}

/// One row of the per-species sighting list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SightingRow {
    pub class_id: ClassId,
    pub name: String,
    pub is_toxic: bool,
    pub count: usize,
}

/// Render-ready result screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultView {
    pub player: Option<PlayerDescriptor>,
    pub sightings: Vec<SightingRow>,
}

/// Resolve a play URL against the service origin.
///
/// Absolute `http`/`https` URLs pass through; anything else is joined
/// onto `origin`.
pub fn resolve_play_url(raw: &str, origin: &Url) -> Result<Url, CoreError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(CoreError::Validation("Result play URL is empty".to_string()));
    }

    if let Ok(url) = Url::parse(raw) {
        return match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(CoreError::Validation(format!(
                "Unsupported play URL scheme '{other}'"
            ))),
        };
    }

    origin
        .join(raw)
        .map_err(|e| CoreError::Validation(format!("Cannot resolve play URL '{raw}': {e}")))
}

/// Build the player descriptor for a result reference.
pub fn player(reference: &ResultReference, origin: &Url) -> Result<PlayerDescriptor, CoreError> {
    let url = resolve_play_url(&reference.play_url, origin)?;
    let (aspect, aspect_is_fallback) = match reference.dimensions {
        Some(d) => (
            AspectRatio {
                width: d.width,
                height: d.height,
            },
            false,
        ),
        None => (DEFAULT_ASPECT, true),
    };

    Ok(PlayerDescriptor {
        url,
        aspect,
        aspect_is_fallback,
        local_path: reference.local_path.clone(),
    })
}

/// Group records into display rows, most frequent first.
pub fn sightings(records: &[DetectionRecord], language: Language) -> Vec<SightingRow> {
    let mut rows: Vec<SightingRow> = Vec::new();
    for record in records {
        match rows.iter_mut().find(|r| r.class_id == record.class_id) {
            Some(row) => {
                row.count += 1;
                row.is_toxic |= record.is_toxic;
            }
            None => rows.push(SightingRow {
                class_id: record.class_id,
                name: knowledge::display_name(record.class_id, language),
                is_toxic: record.is_toxic,
                count: 1,
            }),
        }
    }
    rows.sort_by(|a, b| b.count.cmp(&a.count).then(a.class_id.cmp(&b.class_id)));
    rows
}

/// Compose the result screen from the stored reference and the log.
pub fn result_view(
    reference: Option<&ResultReference>,
    records: &[DetectionRecord],
    origin: &Url,
    language: Language,
) -> Result<ResultView, CoreError> {
    let player = reference.map(|r| player(r, origin)).transpose()?;
    Ok(ResultView {
        player,
        sightings: sightings(records, language),
    })
}

//! Dive report tally.
//!
//! A [`DiveReport`] freezes the detection log at the moment the diver
//! ends the dive so the report screen survives the session reset that
//! follows.

use serde::Serialize;

use crate::detection::DetectionRecord;
use crate::knowledge::Language;
use crate::presentation::{self, SightingRow};
use crate::types::Timestamp;

/// Aggregate numbers shown at the top of the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiveSummary {
    pub total_sightings: usize,
    pub toxic_sightings: usize,
    pub species_count: usize,
    /// Most frequent first, ties broken by class id.
    pub species: Vec<SightingRow>,
}

impl DiveSummary {
    pub fn from_records(records: &[DetectionRecord], language: Language) -> Self {
        let species = presentation::sightings(records, language);
        Self {
            total_sightings: records.len(),
            toxic_sightings: records.iter().filter(|r| r.is_toxic).count(),
            species_count: species.len(),
            species,
        }
    }

    pub fn most_frequent(&self) -> Option<&SightingRow> {
        self.species.first()
    }

    pub fn has_toxic_encounters(&self) -> bool {
        self.toxic_sightings > 0
    }
}

/// Frozen end-of-dive snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct DiveReport {
    pub ended_at: Timestamp,
    pub records: Vec<DetectionRecord>,
}

impl DiveReport {
    pub fn new(records: Vec<DetectionRecord>, ended_at: Timestamp) -> Self {
        Self { ended_at, records }
    }

    pub fn summary(&self, language: Language) -> DiveSummary {
        DiveSummary::from_records(&self.records, language)
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

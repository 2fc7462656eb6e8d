//! Detection records and the session detection log.
//!
//! The log is append-only from the outside: the one-shot clip path
//! replaces it wholesale, live sampling appends to it, and a session
//! reset clears it. Every replacement bumps the log epoch so that live
//! results computed against an older log can be recognised and dropped.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{ClassId, Timestamp};

/// Count of one class reported by the detection service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassCount {
    pub class_id: ClassId,
    pub count: u32,
    pub is_toxic: bool,
}

/// A single sighting. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetectionRecord {
    pub id: Uuid,
    pub class_id: ClassId,
    pub is_toxic: bool,
    pub captured_at: Timestamp,
}

impl DetectionRecord {
    pub fn new(class_id: ClassId, is_toxic: bool, captured_at: Timestamp) -> Self {
        Self {
            id: Uuid::new_v4(),
            class_id,
            is_toxic,
            captured_at,
        }
    }
}

/// Expand per-class counts into one record per counted sighting.
///
/// Records come out in the order of `counts`, `count` copies per entry.
pub fn expand_counts(counts: &[ClassCount], captured_at: Timestamp) -> Vec<DetectionRecord> {
    counts
        .iter()
        .flat_map(|c| (0..c.count).map(move |_| DetectionRecord::new(c.class_id, c.is_toxic, captured_at)))
        .collect()
}

/// Ordered sighting log for one dive.
#[derive(Debug, Clone, Default)]
pub struct DetectionLog {
    records: Vec<DetectionRecord>,
    epoch: u64,
}

impl DetectionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole log (authoritative clip analysis).
    pub fn replace(&mut self, records: Vec<DetectionRecord>) {
        self.records = records;
        self.epoch += 1;
    }

    /// Append sightings after the existing ones (live sampling).
    pub fn append(&mut self, records: impl IntoIterator<Item = DetectionRecord>) {
        self.records.extend(records);
    }

    /// Drop every record. Counts as a replacement for epoch purposes.
    pub fn clear(&mut self) {
        self.records.clear();
        self.epoch += 1;
    }

    /// Invalidate results computed against the current contents without
    /// touching the records.
    pub fn advance_epoch(&mut self) -> u64 {
        self.epoch += 1;
        self.epoch
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn records(&self) -> &[DetectionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Owned copy of the records for callers outside the session lock.
    pub fn snapshot(&self) -> Vec<DetectionRecord> {
        self.records.clone()
    }

    /// Sightings per class id.
    pub fn tally(&self) -> BTreeMap<ClassId, usize> {
        let mut counts = BTreeMap::new();
        for record in &self.records {
            *counts.entry(record.class_id).or_insert(0) += 1;
        }
        counts
    }
}

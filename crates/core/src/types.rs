/// Numeric species category emitted by the detection model.
pub type ClassId = u32;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

//! Patient records as returned by the remote service.

use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use std::fmt;

/// One immutable record. Only the remote service creates these.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Record {
    pub record_id: u64,
    pub subject_name: String,
    pub diagnosis: String,
    pub treatment: String,
    /// Seconds since the Unix epoch.
    pub timestamp: u64,
}

impl Record {
    /// The timestamp as a UTC instant, if it is representable.
    pub fn recorded_at(&self) -> Option<DateTime<Utc>> {
        let secs = i64::try_from(self.timestamp).ok()?;
        DateTime::from_timestamp(secs, 0)
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Record ID: {}", self.record_id)?;
        writeln!(f, "Diagnosis: {}", self.diagnosis)?;
        writeln!(f, "Treatment: {}", self.treatment)?;
        match self.recorded_at() {
            Some(at) => write!(
                f,
                "Timestamp: {}",
                at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
            ),
            None => write!(f, "Timestamp: {}", self.timestamp),
        }
    }
}

//! Structured directory event records and their log-line encoding.
//!
//! Each record is one JSON array on its own line:
//!
//! ```text
//! ["2026-10-16 09:22:00","CREATED","x.txt",{...entry...}]
//! ["2026-10-16 09:22:05","DELETED","x.txt"]
//! ["2026-10-16 09:22:05","MODIFIED","y.txt",{...previous...},{...current...}]
//! ```
//!
//! The event kind and the number of trailing payloads make every line
//! self-describing.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::TIMESTAMP_FORMAT;
use crate::watcher::entry::Entry;

/// Kind of a directory change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventKind {
    Created,
    Deleted,
    Modified,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Created => "CREATED",
            EventKind::Deleted => "DELETED",
            EventKind::Modified => "MODIFIED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "CREATED" => Some(EventKind::Created),
            "DELETED" => Some(EventKind::Deleted),
            "MODIFIED" => Some(EventKind::Modified),
            _ => None,
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Data carried by a record, depending on its kind.
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    Created(Entry),
    Deleted,
    Modified { previous: Entry, current: Entry },
}

/// One logged directory change.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    pub timestamp: DateTime<Utc>,
    pub name: String,
    pub payload: EventPayload,
}

/// A log line that is not a valid event record.
#[derive(Debug)]
pub enum RecordError {
    Json(serde_json::Error),
    Malformed(String),
}

impl std::fmt::Display for RecordError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordError::Json(e) => write!(f, "invalid JSON: {}", e),
            RecordError::Malformed(msg) => write!(f, "malformed record: {}", msg),
        }
    }
}

impl std::error::Error for RecordError {}

impl From<serde_json::Error> for RecordError {
    fn from(e: serde_json::Error) -> Self {
        RecordError::Json(e)
    }
}

impl EventRecord {
    pub fn kind(&self) -> EventKind {
        match self.payload {
            EventPayload::Created(_) => EventKind::Created,
            EventPayload::Deleted => EventKind::Deleted,
            EventPayload::Modified { .. } => EventKind::Modified,
        }
    }

    /// Encodes the record as a single log line (without the newline).
    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        let mut row = vec![
            Value::String(self.timestamp.format(TIMESTAMP_FORMAT).to_string()),
            Value::String(self.kind().as_str().to_string()),
            Value::String(self.name.clone()),
        ];
        match &self.payload {
            EventPayload::Created(entry) => row.push(serde_json::to_value(entry)?),
            EventPayload::Deleted => {}
            EventPayload::Modified { previous, current } => {
                row.push(serde_json::to_value(previous)?);
                row.push(serde_json::to_value(current)?);
            }
        }
        serde_json::to_string(&row)
    }

    /// Decodes a log line produced by [`EventRecord::to_line`].
    pub fn parse_line(line: &str) -> Result<Self, RecordError> {
        let row: Vec<Value> = serde_json::from_str(line.trim())?;
        if row.len() < 3 {
            return Err(RecordError::Malformed(format!(
                "expected at least 3 fields, got {}",
                row.len()
            )));
        }

        let timestamp = row[0]
            .as_str()
            .and_then(|s| NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).ok())
            .map(|naive| naive.and_utc())
            .ok_or_else(|| RecordError::Malformed("invalid timestamp".to_string()))?;
        let kind = row[1]
            .as_str()
            .and_then(EventKind::parse)
            .ok_or_else(|| RecordError::Malformed(format!("unknown event kind {}", row[1])))?;
        let name = row[2]
            .as_str()
            .ok_or_else(|| RecordError::Malformed("name is not a string".to_string()))?
            .to_string();

        let entry_at = |idx: usize| -> Result<Entry, RecordError> {
            let value = row.get(idx).ok_or_else(|| {
                RecordError::Malformed(format!("{} record is missing payload {}", kind, idx - 2))
            })?;
            Ok(Entry::deserialize(value)?)
        };

        let payload = match kind {
            EventKind::Created => EventPayload::Created(entry_at(3)?),
            EventKind::Deleted => EventPayload::Deleted,
            EventKind::Modified => EventPayload::Modified {
                previous: entry_at(3)?,
                current: entry_at(4)?,
            },
        };

        Ok(Self {
            timestamp,
            name,
            payload,
        })
    }
}

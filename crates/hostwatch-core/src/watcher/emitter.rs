//! Turns change-sets into appended event records.

use chrono::{DateTime, Utc};

use crate::storage::{AppendLog, WriteError};
use crate::watcher::diff::ChangeSet;
use crate::watcher::record::{EventPayload, EventRecord};

/// Destination for event batches.
///
/// `append` must be all-or-nothing: on error no record of the batch may be
/// visible to readers.
pub trait EventSink {
    fn append(&mut self, records: &[EventRecord]) -> Result<(), WriteError>;
}

impl EventSink for AppendLog {
    fn append(&mut self, records: &[EventRecord]) -> Result<(), WriteError> {
        let lines = records
            .iter()
            .map(EventRecord::to_line)
            .collect::<Result<Vec<_>, _>>()?;
        self.append_lines(lines)?;
        Ok(())
    }
}

/// In-memory sink, for embedding and tests.
impl EventSink for Vec<EventRecord> {
    fn append(&mut self, records: &[EventRecord]) -> Result<(), WriteError> {
        self.extend_from_slice(records);
        Ok(())
    }
}

/// Builds the records for a change-set: created, then deleted, then
/// modified, each group in name order.
pub fn build_records(timestamp: DateTime<Utc>, changes: &ChangeSet) -> Vec<EventRecord> {
    let mut records = Vec::with_capacity(changes.len());

    for (name, entry) in &changes.created {
        records.push(EventRecord {
            timestamp,
            name: name.clone(),
            payload: EventPayload::Created(entry.clone()),
        });
    }
    for name in &changes.deleted {
        records.push(EventRecord {
            timestamp,
            name: name.clone(),
            payload: EventPayload::Deleted,
        });
    }
    for m in &changes.modified {
        records.push(EventRecord {
            timestamp,
            name: m.name.clone(),
            payload: EventPayload::Modified {
                previous: m.previous.clone(),
                current: m.current.clone(),
            },
        });
    }

    records
}

/// Writes change-sets to a sink. Holds no watcher state.
pub struct EventEmitter<S: EventSink> {
    sink: S,
}

impl<S: EventSink> EventEmitter<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Appends one record per change as a single batch.
    ///
    /// Returns the number of records written. An empty change-set writes
    /// nothing.
    pub fn emit(&mut self, timestamp: DateTime<Utc>, changes: &ChangeSet) -> Result<usize, WriteError> {
        let records = build_records(timestamp, changes);
        if records.is_empty() {
            return Ok(0);
        }
        self.sink.append(&records)?;
        Ok(records.len())
    }
}

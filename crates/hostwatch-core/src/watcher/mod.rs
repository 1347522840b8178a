//! Directory-change detection.
//!
//! A [`DirectoryWatcher`] repeatedly captures a [`Snapshot`] of one directory's
//! immediate children, diffs it against the previous one and appends a
//! CREATED / DELETED / MODIFIED [`EventRecord`] per change.

pub mod diff;
pub mod emitter;
pub mod entry;
pub mod error;
pub mod poller;
pub mod record;
pub mod snapshot;

pub use diff::{ChangeSet, Modified, diff};
pub use emitter::{EventEmitter, EventSink, build_records};
pub use entry::{Entry, EntryKind};
pub use error::{AccessError, PollError, TransientEntryError};
pub use poller::{DirectoryWatcher, PollReport, PollState};
pub use record::{EventKind, EventPayload, EventRecord, RecordError};
pub use snapshot::{Capture, Snapshot, capture, display_name, take_snapshot};

pub use crate::storage::WriteError;

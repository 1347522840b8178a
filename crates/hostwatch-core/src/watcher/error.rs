//! Error types raised by the directory watcher.

use std::io;
use std::path::PathBuf;

use crate::storage::WriteError;

/// The watched directory could not be listed.
#[derive(Debug)]
pub struct AccessError {
    pub path: PathBuf,
    pub source: io::Error,
}

impl std::fmt::Display for AccessError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "cannot list directory {}: {}",
            self.path.display(),
            self.source
        )
    }
}

impl std::error::Error for AccessError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// An entry vanished (or could not be stated) between listing and stating.
///
/// Never fails a snapshot; the entry is left out of that poll.
#[derive(Debug)]
pub struct TransientEntryError {
    pub name: String,
    pub source: io::Error,
}

impl std::fmt::Display for TransientEntryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "entry {} skipped: {}", self.name, self.source)
    }
}

impl std::error::Error for TransientEntryError {}

/// Failure of one poll cycle.
#[derive(Debug)]
pub enum PollError {
    /// Sampling failed; nothing was diffed or written.
    Access(AccessError),
    /// The change-set could not be appended; the baseline was kept.
    Write(WriteError),
}

impl std::fmt::Display for PollError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PollError::Access(e) => write!(f, "snapshot failed: {}", e),
            PollError::Write(e) => write!(f, "emit failed: {}", e),
        }
    }
}

impl std::error::Error for PollError {}

impl From<AccessError> for PollError {
    fn from(e: AccessError) -> Self {
        PollError::Access(e)
    }
}

impl From<WriteError> for PollError {
    fn from(e: WriteError) -> Self {
        PollError::Write(e)
    }
}

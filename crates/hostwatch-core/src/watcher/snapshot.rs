//! Point-in-time view of a directory's immediate children.

use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::path::Path;

use tracing::debug;

use crate::collector::FileSystem;
use crate::watcher::entry::Entry;
use crate::watcher::error::{AccessError, TransientEntryError};

/// Mapping from child name to its metadata, ordered by name.
///
/// Keyed by the raw OS name, so names that are not valid UTF-8 stay distinct.
/// Built fresh on every poll and never mutated afterwards by the watcher.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    entries: BTreeMap<OsString, Entry>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<OsString>, entry: Entry) {
        self.entries.insert(name.into(), entry);
    }

    pub fn get(&self, name: impl AsRef<OsStr>) -> Option<&Entry> {
        self.entries.get(name.as_ref())
    }

    pub fn contains(&self, name: impl AsRef<OsStr>) -> bool {
        self.entries.contains_key(name.as_ref())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&OsString, &Entry)> {
        self.entries.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &OsStr> {
        self.entries.keys().map(OsString::as_os_str)
    }
}

impl<N: Into<OsString>> FromIterator<(N, Entry)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (N, Entry)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(name, entry)| (name.into(), entry))
                .collect(),
        }
    }
}

/// Renders an OS name for the event log.
///
/// Valid UTF-8 is kept as is; every byte of an invalid sequence becomes `\xNN`.
#[cfg(unix)]
pub fn display_name(name: &OsStr) -> String {
    use std::os::unix::ffi::OsStrExt;

    let mut bytes = name.as_bytes();
    let mut out = String::with_capacity(bytes.len());
    loop {
        match std::str::from_utf8(bytes) {
            Ok(valid) => {
                out.push_str(valid);
                return out;
            }
            Err(e) => {
                let (valid, rest) = bytes.split_at(e.valid_up_to());
                out.push_str(std::str::from_utf8(valid).unwrap_or_default());
                let invalid = e.error_len().unwrap_or(rest.len());
                for b in &rest[..invalid] {
                    out.push_str(&format!("\\x{:02x}", b));
                }
                bytes = &rest[invalid..];
            }
        }
    }
}

#[cfg(not(unix))]
pub fn display_name(name: &OsStr) -> String {
    name.to_string_lossy().into_owned()
}

/// Result of scanning a directory: the snapshot plus entries that were
/// listed but could not be stated.
#[derive(Debug, Default)]
pub struct Capture {
    pub snapshot: Snapshot,
    pub skipped: Vec<TransientEntryError>,
}

/// Lists the immediate children of `dir` and stats each one.
///
/// Fails only if the directory itself cannot be listed. Children that
/// disappear between listing and stating end up in `skipped`.
pub fn capture<F: FileSystem>(fs: &F, dir: &Path) -> Result<Capture, AccessError> {
    let paths = fs.read_dir(dir).map_err(|source| AccessError {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut capture = Capture::default();
    for path in paths {
        let Some(name) = path.file_name().map(OsStr::to_os_string) else {
            continue;
        };
        match fs.stat(&path) {
            Ok(entry) => capture.snapshot.insert(name, entry),
            Err(source) => capture.skipped.push(TransientEntryError {
                name: display_name(&name),
                source,
            }),
        }
    }

    Ok(capture)
}

/// Like [`capture`], logging and dropping transient entry failures.
pub fn take_snapshot<F: FileSystem>(fs: &F, dir: &Path) -> Result<Snapshot, AccessError> {
    let capture = capture(fs, dir)?;
    for skipped in &capture.skipped {
        debug!("{}", skipped);
    }
    Ok(capture.snapshot)
}

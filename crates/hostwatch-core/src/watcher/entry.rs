//! Metadata captured for one child of the watched directory.

use serde::{Deserialize, Serialize};
use std::fs::Metadata;

/// Kind of a directory child, decided from a live check at snapshot time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    File,
    Directory,
}

/// Metadata of one directory child.
///
/// Equality is field-wise over every attribute: two entries that differ only
/// in `permissions` are different.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub size: u64,
    /// Platform mode bits, kept verbatim (e.g. `0o100644`).
    pub permissions: String,
    pub owner: u32,
    pub group: u32,
    /// Seconds since epoch.
    #[serde(rename = "atime")]
    pub accessed: f64,
    #[serde(rename = "mtime")]
    pub modified: f64,
    #[serde(rename = "ctime")]
    pub changed: f64,
}

impl Entry {
    /// A file entry with the given size and zeroed ownership and times.
    pub fn file(size: u64) -> Self {
        Self {
            kind: EntryKind::File,
            size,
            permissions: "0o100644".to_string(),
            owner: 0,
            group: 0,
            accessed: 0.0,
            modified: 0.0,
            changed: 0.0,
        }
    }

    /// A directory entry with zeroed ownership and times.
    pub fn directory() -> Self {
        Self {
            kind: EntryKind::Directory,
            size: 4096,
            permissions: "0o40755".to_string(),
            owner: 0,
            group: 0,
            accessed: 0.0,
            modified: 0.0,
            changed: 0.0,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    #[cfg(unix)]
    pub fn from_metadata(meta: &Metadata) -> Self {
        use std::os::unix::fs::MetadataExt;

        Self {
            kind: kind_of(meta),
            size: meta.size(),
            permissions: format!("{:#o}", meta.mode()),
            owner: meta.uid(),
            group: meta.gid(),
            accessed: epoch_secs(meta.atime(), meta.atime_nsec()),
            modified: epoch_secs(meta.mtime(), meta.mtime_nsec()),
            changed: epoch_secs(meta.ctime(), meta.ctime_nsec()),
        }
    }

    #[cfg(not(unix))]
    pub fn from_metadata(meta: &Metadata) -> Self {
        use std::time::{SystemTime, UNIX_EPOCH};

        let secs = |t: std::io::Result<SystemTime>| {
            t.ok()
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map(|d| d.as_secs_f64())
                .unwrap_or(0.0)
        };
        let permissions = if meta.permissions().readonly() {
            "readonly"
        } else {
            "readwrite"
        };

        Self {
            kind: kind_of(meta),
            size: meta.len(),
            permissions: permissions.to_string(),
            owner: 0,
            group: 0,
            accessed: secs(meta.accessed()),
            modified: secs(meta.modified()),
            changed: secs(meta.created()),
        }
    }
}

fn kind_of(meta: &Metadata) -> EntryKind {
    if meta.is_dir() {
        EntryKind::Directory
    } else {
        EntryKind::File
    }
}

#[cfg(unix)]
fn epoch_secs(secs: i64, nanos: i64) -> f64 {
    secs as f64 + nanos as f64 / 1_000_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_equality_covers_permissions() {
        let a = Entry::file(10);
        let mut b = a.clone();
        assert_eq!(a, b);
        b.permissions = "0o100600".to_string();
        assert_ne!(a, b);
    }

    #[test]
    fn test_equality_covers_timestamps_and_owner() {
        let a = Entry::file(10);

        let mut b = a.clone();
        b.changed = 1.5;
        assert_ne!(a, b);

        let mut c = a.clone();
        c.group = 100;
        assert_ne!(a, c);
    }

    #[test]
    fn test_from_metadata_file_and_directory() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("data.bin");
        fs::write(&file, b"12345").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();

        let entry = Entry::from_metadata(&fs::metadata(&file).unwrap());
        assert_eq!(entry.kind, EntryKind::File);
        assert_eq!(entry.size, 5);
        assert!(entry.modified > 0.0);

        let sub = Entry::from_metadata(&fs::metadata(dir.path().join("sub")).unwrap());
        assert!(sub.is_dir());
    }

    #[cfg(unix)]
    #[test]
    fn test_from_metadata_permissions_are_octal() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let file = dir.path().join("script.sh");
        fs::write(&file, b"#!/bin/sh\n").unwrap();
        fs::set_permissions(&file, fs::Permissions::from_mode(0o750)).unwrap();

        let entry = Entry::from_metadata(&fs::metadata(&file).unwrap());
        assert_eq!(entry.permissions, "0o100750");
    }

    #[test]
    fn test_serialized_field_names() {
        let value = serde_json::to_value(Entry::file(3)).unwrap();
        assert_eq!(value["type"], "File");
        assert_eq!(value["size"], 3);
        assert!(value.get("mtime").is_some());
        assert!(value.get("atime").is_some());
        assert!(value.get("ctime").is_some());
    }
}

//! Abstractions for filesystem access to enable testing and mocking.
//!
//! The `FileSystem` trait lets the metrics sampler and the directory watcher
//! work against the real filesystem or an in-memory mock.

use std::io;
use std::path::{Path, PathBuf};

use crate::watcher::Entry;

/// Abstraction for the filesystem operations the collectors need.
pub trait FileSystem: Send + Sync {
    /// Reads the entire contents of a file as a string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Checks if a path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Lists the immediate children of a directory as full paths.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;

    /// Reads the metadata of `path`, following symlinks.
    ///
    /// Returns `NotFound` if the path disappeared since it was listed.
    fn stat(&self, path: &Path) -> io::Result<Entry>;
}

/// Real filesystem implementation that delegates to `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFs;

impl RealFs {
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for RealFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let entries = std::fs::read_dir(path)?;
        let mut paths = Vec::new();
        for entry in entries {
            paths.push(entry?.path());
        }
        Ok(paths)
    }

    fn stat(&self, path: &Path) -> io::Result<Entry> {
        std::fs::metadata(path).map(|meta| Entry::from_metadata(&meta))
    }
}

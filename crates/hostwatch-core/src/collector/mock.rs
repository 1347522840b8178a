//! In-memory mock filesystem for testing collectors and the watcher.
//!
//! `MockFs` simulates files, directories and per-path metadata in memory, so
//! `/proc` layouts and watched directories can be scripted without touching
//! the disk. Paths registered with [`MockFs::add_vanishing`] are listed by
//! `read_dir` but fail `stat`, which reproduces an entry deleted between
//! listing and stating.

use crate::collector::traits::FileSystem;
use crate::watcher::Entry;
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default)]
pub struct MockFs {
    /// Map from path to file contents.
    files: HashMap<PathBuf, String>,
    /// Set of directories (for read_dir support).
    directories: HashSet<PathBuf>,
    /// Explicit metadata, overriding what is derived from files/directories.
    metadata: HashMap<PathBuf, Entry>,
    /// Paths that are listed but can no longer be stated.
    vanishing: HashSet<PathBuf>,
}

impl MockFs {
    /// Creates a new empty mock filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file with the given content.
    ///
    /// Parent directories are automatically created.
    pub fn add_file(&mut self, path: impl AsRef<Path>, content: impl Into<String>) {
        let path = path.as_ref().to_path_buf();
        self.add_parents(&path);
        self.files.insert(path, content.into());
    }

    /// Adds an empty directory.
    pub fn add_dir(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        self.add_parents(&path);
        self.directories.insert(path);
    }

    /// Adds a directory child with explicit metadata.
    ///
    /// Directory entries are registered as directories, everything else as
    /// an empty file.
    pub fn add_entry(&mut self, path: impl AsRef<Path>, entry: Entry) {
        let path = path.as_ref().to_path_buf();
        if entry.is_dir() {
            self.add_dir(&path);
        } else {
            self.add_file(&path, "");
        }
        self.metadata.insert(path, entry);
    }

    /// Replaces the metadata reported for an existing path.
    pub fn set_entry(&mut self, path: impl AsRef<Path>, entry: Entry) {
        self.metadata.insert(path.as_ref().to_path_buf(), entry);
    }

    /// Adds a path that shows up in its parent's listing but fails `stat`.
    pub fn add_vanishing(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        self.add_parents(&path);
        self.vanishing.insert(path);
    }

    /// Removes a file or directory (and everything below it).
    pub fn remove(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        self.files.retain(|p, _| !p.starts_with(path));
        self.directories.retain(|p| !p.starts_with(path));
        self.metadata.retain(|p, _| !p.starts_with(path));
        self.vanishing.retain(|p| !p.starts_with(path));
    }

    /// Moves a single path, keeping its contents and metadata.
    pub fn rename(&mut self, from: impl AsRef<Path>, to: impl AsRef<Path>) {
        let (from, to) = (from.as_ref(), to.as_ref().to_path_buf());
        if let Some(content) = self.files.remove(from) {
            self.files.insert(to.clone(), content);
        }
        if self.directories.remove(from) {
            self.directories.insert(to.clone());
        }
        if let Some(entry) = self.metadata.remove(from) {
            self.metadata.insert(to, entry);
        }
    }

    /// Adds a process with the `/proc/[pid]/stat` content.
    pub fn add_process(&mut self, pid: u32, stat: &str) {
        let base = PathBuf::from(format!("/proc/{}", pid));
        self.add_dir(&base);
        self.add_file(base.join("stat"), stat);
    }

    fn add_parents(&mut self, path: &Path) {
        let mut parent = path.parent();
        while let Some(p) = parent {
            if !p.as_os_str().is_empty() {
                self.directories.insert(p.to_path_buf());
            }
            parent = p.parent();
        }
    }
}

impl FileSystem for MockFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("file not found: {:?}", path),
            )
        })
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path) || self.directories.contains(path)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        if !self.directories.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("directory not found: {:?}", path),
            ));
        }

        let is_child = |p: &PathBuf| p.parent().is_some_and(|parent| parent == path) && p != path;

        let entries: HashSet<PathBuf> = self
            .files
            .keys()
            .chain(self.directories.iter())
            .chain(self.vanishing.iter())
            .filter(|p| is_child(*p))
            .cloned()
            .collect();

        Ok(entries.into_iter().collect())
    }

    fn stat(&self, path: &Path) -> io::Result<Entry> {
        if self.vanishing.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("entry vanished: {:?}", path),
            ));
        }
        if let Some(entry) = self.metadata.get(path) {
            return Ok(entry.clone());
        }
        if let Some(content) = self.files.get(path) {
            return Ok(Entry::file(content.len() as u64));
        }
        if self.directories.contains(path) {
            return Ok(Entry::directory());
        }
        Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("path not found: {:?}", path),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_fs_add_file() {
        let mut fs = MockFs::new();
        fs.add_file("/proc/meminfo", "MemTotal: 16384 kB\n");

        assert!(fs.exists(Path::new("/proc/meminfo")));
        assert!(fs.exists(Path::new("/proc")));

        let content = fs.read_to_string(Path::new("/proc/meminfo")).unwrap();
        assert_eq!(content, "MemTotal: 16384 kB\n");
    }

    #[test]
    fn test_mock_fs_read_dir() {
        let mut fs = MockFs::new();
        fs.add_process(1, "1 (init) S 0");
        fs.add_process(2, "2 (kthreadd) S 0");
        fs.add_file("/proc/uptime", "10.0 20.0\n");

        let proc_entries = fs.read_dir(Path::new("/proc")).unwrap();
        assert_eq!(proc_entries.len(), 3);

        let proc1_entries = fs.read_dir(Path::new("/proc/1")).unwrap();
        assert_eq!(proc1_entries, vec![PathBuf::from("/proc/1/stat")]);
    }

    #[test]
    fn test_mock_fs_not_found() {
        let fs = MockFs::new();
        let result = fs.read_to_string(Path::new("/nonexistent"));
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::NotFound);
        assert!(fs.read_dir(Path::new("/nonexistent")).is_err());
    }

    #[test]
    fn test_mock_fs_stat_derived_and_explicit() {
        let mut fs = MockFs::new();
        fs.add_file("/w/a.txt", "hello");
        fs.add_dir("/w/sub");
        let mut custom = Entry::file(99);
        custom.owner = 1000;
        fs.add_entry("/w/b.txt", custom.clone());

        assert_eq!(fs.stat(Path::new("/w/a.txt")).unwrap(), Entry::file(5));
        assert!(fs.stat(Path::new("/w/sub")).unwrap().is_dir());
        assert_eq!(fs.stat(Path::new("/w/b.txt")).unwrap(), custom);
    }

    #[test]
    fn test_mock_fs_vanishing_is_listed_but_not_statable() {
        let mut fs = MockFs::new();
        fs.add_dir("/w");
        fs.add_vanishing("/w/ghost.tmp");

        let listed = fs.read_dir(Path::new("/w")).unwrap();
        assert_eq!(listed, vec![PathBuf::from("/w/ghost.tmp")]);
        let err = fs.stat(Path::new("/w/ghost.tmp")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_mock_fs_remove_and_rename() {
        let mut fs = MockFs::new();
        fs.add_entry("/w/a.txt", Entry::file(7));
        fs.add_file("/w/dir/inner", "x");

        fs.rename("/w/a.txt", "/w/b.txt");
        assert!(!fs.exists(Path::new("/w/a.txt")));
        assert_eq!(fs.stat(Path::new("/w/b.txt")).unwrap(), Entry::file(7));

        fs.remove("/w/dir");
        assert!(!fs.exists(Path::new("/w/dir")));
        assert!(!fs.exists(Path::new("/w/dir/inner")));
        assert!(fs.exists(Path::new("/w")));
    }
}

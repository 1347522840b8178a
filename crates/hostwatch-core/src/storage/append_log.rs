//! Append-only line log with all-or-nothing batch writes.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::warn;

/// The log destination could not be written.
#[derive(Debug)]
pub enum WriteError {
    /// The file (or its parent directory) could not be opened, created, or
    /// cleared of a torn last line.
    Open { path: PathBuf, source: io::Error },
    /// Appending or syncing failed; the batch was rolled back.
    Append { path: PathBuf, source: io::Error },
    /// A record could not be encoded.
    Encode(serde_json::Error),
}

impl std::fmt::Display for WriteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WriteError::Open { path, source } => {
                write!(f, "cannot open {}: {}", path.display(), source)
            }
            WriteError::Append { path, source } => {
                write!(f, "cannot append to {}: {}", path.display(), source)
            }
            WriteError::Encode(e) => write!(f, "cannot encode record: {}", e),
        }
    }
}

impl std::error::Error for WriteError {}

impl From<serde_json::Error> for WriteError {
    fn from(e: serde_json::Error) -> Self {
        WriteError::Encode(e)
    }
}

const TAIL_SCAN_CHUNK: usize = 4096;

/// Length of the longest prefix of the first `len` bytes that ends with a
/// newline, or 0 if there is none.
fn complete_prefix_len<R: Read + Seek>(reader: &mut R, len: u64) -> io::Result<u64> {
    let mut chunk = [0u8; TAIL_SCAN_CHUNK];
    let mut end = len;
    while end > 0 {
        let start = end.saturating_sub(TAIL_SCAN_CHUNK as u64);
        let buf = &mut chunk[..(end - start) as usize];
        reader.seek(SeekFrom::Start(start))?;
        reader.read_exact(buf)?;
        if let Some(pos) = buf.iter().rposition(|&b| b == b'\n') {
            return Ok(start + pos as u64 + 1);
        }
        end = start;
    }
    Ok(0)
}

/// File a batch is committed to.
trait BatchFile: Write {
    fn sync(&mut self) -> io::Result<()>;
    fn truncate(&mut self, len: u64) -> io::Result<()>;
}

impl BatchFile for File {
    fn sync(&mut self) -> io::Result<()> {
        self.sync_all()
    }

    fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }
}

/// Writes and syncs `buf`. On failure the file is cut back to `start`.
fn commit_batch<F: BatchFile>(file: &mut F, buf: &[u8], start: u64, path: &Path) -> io::Result<()> {
    let result = file.write_all(buf).and_then(|()| file.sync());
    if result.is_err()
        && let Err(e) = file.truncate(start)
    {
        warn!(
            "Failed to roll back partial batch in {}: {}",
            path.display(),
            e
        );
    }
    result
}

/// Append-only log of newline-terminated lines.
///
/// The file is opened per batch, so a log removed or rotated externally is
/// recreated on the next write.
#[derive(Debug, Clone)]
pub struct AppendLog {
    path: PathBuf,
}

impl AppendLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends `lines` as one batch and returns how many were written.
    ///
    /// The batch is written with a single `write_all` followed by `sync_all`.
    /// If either fails the file is truncated back to its previous length, so
    /// readers never see part of a batch. A torn last line left by an earlier
    /// crash is truncated first, so the batch always starts on a new line.
    pub fn append_lines<I, S>(&self, lines: I) -> Result<usize, WriteError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut buf = String::new();
        let mut count = 0usize;
        for line in lines {
            buf.push_str(line.as_ref());
            buf.push('\n');
            count += 1;
        }
        if count == 0 {
            return Ok(0);
        }

        let open_err = |source| WriteError::Open {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(open_err)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)
            .map_err(open_err)?;
        let start = self.repair_torn_tail(&mut file).map_err(open_err)?;

        commit_batch(&mut file, buf.as_bytes(), start, &self.path).map_err(|source| {
            WriteError::Append {
                path: self.path.clone(),
                source,
            }
        })?;

        Ok(count)
    }

    /// Truncates trailing bytes after the last newline and returns the new
    /// length.
    fn repair_torn_tail(&self, file: &mut File) -> io::Result<u64> {
        let len = file.metadata()?.len();
        let end = complete_prefix_len(file, len)?;
        if end < len {
            warn!(
                "Torn last line in {}: {} bytes after the last complete line. Truncating.",
                self.path.display(),
                len - end
            );
            file.set_len(end)?;
        }
        Ok(end)
    }

    /// Reads every line of the log. A missing file reads as empty.
    pub fn read_lines(&self) -> io::Result<Vec<String>> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(content.lines().map(str::to_string).collect()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_append_creates_parent_and_file() {
        let dir = tempdir().unwrap();
        let log = AppendLog::new(dir.path().join("logs").join("events.jsonl"));

        assert_eq!(log.append_lines(["one", "two"]).unwrap(), 2);
        assert_eq!(
            fs::read_to_string(log.path()).unwrap(),
            "one\ntwo\n"
        );
    }

    #[test]
    fn test_append_preserves_existing_content() {
        let dir = tempdir().unwrap();
        let log = AppendLog::new(dir.path().join("events.jsonl"));

        log.append_lines(["first"]).unwrap();
        log.append_lines(vec!["second".to_string(), "third".to_string()])
            .unwrap();

        assert_eq!(log.read_lines().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_empty_batch_does_not_touch_disk() {
        let dir = tempdir().unwrap();
        let log = AppendLog::new(dir.path().join("never.jsonl"));

        assert_eq!(log.append_lines(Vec::<String>::new()).unwrap(), 0);
        assert!(!log.path().exists());
    }

    #[test]
    fn test_unopenable_destination_is_open_error() {
        let dir = tempdir().unwrap();
        // A directory cannot be opened for appending.
        let log = AppendLog::new(dir.path());

        let err = log.append_lines(["x"]).unwrap_err();
        assert!(matches!(err, WriteError::Open { .. }));
    }

    #[test]
    fn test_parent_is_a_file_is_open_error() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "file, not dir").unwrap();
        let log = AppendLog::new(blocker.join("events.jsonl"));

        assert!(matches!(
            log.append_lines(["x"]),
            Err(WriteError::Open { .. })
        ));
    }

    #[test]
    fn test_torn_last_line_is_truncated_before_append() {
        let dir = tempdir().unwrap();
        let log = AppendLog::new(dir.path().join("events.jsonl"));
        fs::write(log.path(), "first\n[\"2026-10-16 09:00:00\",\"DELETED\",\"par").unwrap();

        log.append_lines(["second"]).unwrap();
        assert_eq!(fs::read_to_string(log.path()).unwrap(), "first\nsecond\n");
    }

    #[test]
    fn test_file_without_any_newline_is_cleared() {
        let dir = tempdir().unwrap();
        let log = AppendLog::new(dir.path().join("events.jsonl"));
        fs::write(log.path(), "garbage").unwrap();

        log.append_lines(["one"]).unwrap();
        assert_eq!(log.read_lines().unwrap(), vec!["one"]);
    }

    #[test]
    fn test_complete_prefix_len_scans_back_across_chunks() {
        let mut data = b"head\n".to_vec();
        data.extend(std::iter::repeat_n(b'x', TAIL_SCAN_CHUNK * 2 + 17));
        let len = data.len() as u64;
        let mut cursor = io::Cursor::new(data);
        assert_eq!(complete_prefix_len(&mut cursor, len).unwrap(), 5);

        let mut clean = io::Cursor::new(b"a\nb\n".to_vec());
        assert_eq!(complete_prefix_len(&mut clean, 4).unwrap(), 4);
        let mut empty = io::Cursor::new(Vec::new());
        assert_eq!(complete_prefix_len(&mut empty, 0).unwrap(), 0);
    }

    /// File that accepts `budget` bytes, then fails writes (or the sync).
    struct ShortFile {
        file: File,
        budget: usize,
        fail_sync: bool,
    }

    impl Write for ShortFile {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.budget == 0 {
                return Err(io::Error::other("disk full"));
            }
            let n = self.file.write(&buf[..buf.len().min(self.budget)])?;
            self.budget -= n;
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            self.file.flush()
        }
    }

    impl BatchFile for ShortFile {
        fn sync(&mut self) -> io::Result<()> {
            if self.fail_sync {
                return Err(io::Error::other("sync failed"));
            }
            self.file.sync_all()
        }

        fn truncate(&mut self, len: u64) -> io::Result<()> {
            self.file.set_len(len)
        }
    }

    fn short_file(path: &Path, budget: usize, fail_sync: bool) -> ShortFile {
        ShortFile {
            file: OpenOptions::new().append(true).open(path).unwrap(),
            budget,
            fail_sync,
        }
    }

    #[test]
    fn test_partial_write_is_rolled_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        fs::write(&path, "first\n").unwrap();

        let mut file = short_file(&path, 4, false);
        let err = commit_batch(&mut file, b"second\nthird\n", 6, &path).unwrap_err();
        assert_eq!(err.to_string(), "disk full");
        assert_eq!(fs::metadata(&path).unwrap().len(), 6);
        assert_eq!(fs::read_to_string(&path).unwrap(), "first\n");
    }

    #[test]
    fn test_failed_sync_rolls_back_whole_batch() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        fs::write(&path, "first\n").unwrap();

        let mut file = short_file(&path, usize::MAX, true);
        assert!(commit_batch(&mut file, b"second\n", 6, &path).is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "first\n");

        // the log stays appendable afterwards
        let log = AppendLog::new(&path);
        log.append_lines(["third"]).unwrap();
        assert_eq!(log.read_lines().unwrap(), vec!["first", "third"]);
    }

    #[test]
    fn test_read_lines_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let log = AppendLog::new(dir.path().join("absent.jsonl"));
        assert!(log.read_lines().unwrap().is_empty());
    }
}

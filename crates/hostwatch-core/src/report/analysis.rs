//! Aggregate statistics over the event and metrics logs.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::report::ReportError;
use crate::watcher::EventRecord;

/// Number of histogram bins over the 0-100 % range.
pub const HISTOGRAM_BINS: usize = 15;

/// Summary of the directory event log.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DirectoryStats {
    /// Well-formed records in the log.
    pub total: u64,
    /// Record count per event kind (`CREATED`, `DELETED`, `MODIFIED`).
    pub breakdown: BTreeMap<String, u64>,
    /// Name with the most records. Ties go to the lexicographically smallest.
    pub top_file: Option<String>,
    /// Lines that could not be parsed.
    pub skipped_lines: u64,
}

/// Fixed-width histogram over 0-100 %.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub bins: Vec<u64>,
}

impl Default for Histogram {
    fn default() -> Self {
        Self {
            bins: vec![0; HISTOGRAM_BINS],
        }
    }
}

impl Histogram {
    pub fn bin_width() -> f64 {
        100.0 / HISTOGRAM_BINS as f64
    }

    /// Adds one value. Values outside 0-100 land in the edge bins.
    pub fn add(&mut self, percent: f64) {
        let idx = (percent.clamp(0.0, 100.0) / Self::bin_width()) as usize;
        self.bins[idx.min(HISTOGRAM_BINS - 1)] += 1;
    }

    /// Lower and upper bound of bin `idx`.
    pub fn range(idx: usize) -> (f64, f64) {
        let w = Self::bin_width();
        (idx as f64 * w, (idx + 1) as f64 * w)
    }

    pub fn total(&self) -> u64 {
        self.bins.iter().sum()
    }

    pub fn max(&self) -> u64 {
        self.bins.iter().copied().max().unwrap_or(0)
    }
}

/// Summary of the metrics log.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PerformanceStats {
    pub samples: u64,
    pub avg_cpu: f64,
    pub avg_mem: f64,
    pub peak_cpu: f64,
    pub cpu_histogram: Histogram,
    pub memory_histogram: Histogram,
    pub skipped_lines: u64,
}

/// The two fields the report needs from a metrics row.
#[derive(Deserialize)]
struct UsageRow {
    cpu_percent: f64,
    memory_percent: f64,
}

fn read_optional(path: &Path) -> Result<Option<Vec<u8>>, ReportError> {
    match fs::read(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(ReportError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Splits raw log bytes into lines. Lines that are not valid UTF-8 are
/// dropped and counted.
fn utf8_lines(content: &[u8]) -> (Vec<&str>, u64) {
    let mut lines = Vec::new();
    let mut invalid = 0;
    for (idx, raw) in content.split(|&b| b == b'\n').enumerate() {
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        match std::str::from_utf8(raw) {
            Ok(line) => lines.push(line),
            Err(e) => {
                debug!("Skipping line {}: {}", idx + 1, e);
                invalid += 1;
            }
        }
    }
    (lines, invalid)
}

/// Reads and summarizes the event log. A missing log yields empty stats.
pub fn analyze_directory_log(path: &Path) -> Result<DirectoryStats, ReportError> {
    match read_optional(path)? {
        Some(content) => {
            let (lines, invalid) = utf8_lines(&content);
            let mut stats = directory_stats_from_lines(lines);
            stats.skipped_lines += invalid;
            Ok(stats)
        }
        None => {
            debug!("No event log at {}", path.display());
            Ok(DirectoryStats::default())
        }
    }
}

/// Summarizes event log lines, skipping blank and malformed ones.
pub fn directory_stats_from_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> DirectoryStats {
    let mut stats = DirectoryStats::default();
    let mut per_name: BTreeMap<String, u64> = BTreeMap::new();

    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        match EventRecord::parse_line(line) {
            Ok(record) => {
                stats.total += 1;
                *stats
                    .breakdown
                    .entry(record.kind().as_str().to_string())
                    .or_default() += 1;
                *per_name.entry(record.name).or_default() += 1;
            }
            Err(e) => {
                debug!("Skipping event line: {}", e);
                stats.skipped_lines += 1;
            }
        }
    }

    // BTreeMap iterates names in order, so the first maximum is the smallest name.
    let mut best: Option<(&String, u64)> = None;
    for (name, &count) in &per_name {
        if best.is_none_or(|(_, c)| count > c) {
            best = Some((name, count));
        }
    }
    stats.top_file = best.map(|(name, _)| name.clone());

    stats
}

/// Reads and summarizes the metrics log. A missing log yields empty stats.
pub fn analyze_metrics_log(path: &Path) -> Result<PerformanceStats, ReportError> {
    match read_optional(path)? {
        Some(content) => {
            let (lines, invalid) = utf8_lines(&content);
            let mut stats = performance_stats_from_lines(lines);
            stats.skipped_lines += invalid;
            Ok(stats)
        }
        None => {
            debug!("No metrics log at {}", path.display());
            Ok(PerformanceStats::default())
        }
    }
}

/// Summarizes metrics log lines, skipping blank and malformed ones.
pub fn performance_stats_from_lines<'a>(
    lines: impl IntoIterator<Item = &'a str>,
) -> PerformanceStats {
    let mut stats = PerformanceStats::default();
    let (mut cpu_sum, mut mem_sum) = (0.0, 0.0);

    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        let row: UsageRow = match serde_json::from_str(line) {
            Ok(row) => row,
            Err(e) => {
                debug!("Skipping metrics line: {}", e);
                stats.skipped_lines += 1;
                continue;
            }
        };

        if stats.samples == 0 || row.cpu_percent > stats.peak_cpu {
            stats.peak_cpu = row.cpu_percent;
        }
        stats.samples += 1;
        cpu_sum += row.cpu_percent;
        mem_sum += row.memory_percent;
        stats.cpu_histogram.add(row.cpu_percent);
        stats.memory_histogram.add(row.memory_percent);
    }

    if stats.samples > 0 {
        stats.avg_cpu = cpu_sum / stats.samples as f64;
        stats.avg_mem = mem_sum / stats.samples as f64;
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const EVENTS: &str = r#"["2026-10-16 09:00:00","CREATED","a.txt",{"type":"File","size":1,"permissions":"0o100644","owner":0,"group":0,"atime":0.0,"mtime":0.0,"ctime":0.0}]
["2026-10-16 09:00:05","CREATED","b.txt",{"type":"File","size":1,"permissions":"0o100644","owner":0,"group":0,"atime":0.0,"mtime":0.0,"ctime":0.0}]
["2026-10-16 09:00:10","MODIFIED","b.txt",{"type":"File","size":1,"permissions":"0o100644","owner":0,"group":0,"atime":0.0,"mtime":0.0,"ctime":0.0},{"type":"File","size":2,"permissions":"0o100644","owner":0,"group":0,"atime":0.0,"mtime":0.0,"ctime":0.0}]
this line is garbage
["2026-10-16 09:00:15","DELETED","a.txt"]
["2026-10-16 09:00:20","DELETED"]
"#;

    #[test]
    fn test_directory_stats_breakdown_and_skips() {
        let stats = directory_stats_from_lines(EVENTS.lines());
        assert_eq!(stats.total, 4);
        assert_eq!(stats.skipped_lines, 2);
        assert_eq!(stats.breakdown.get("CREATED"), Some(&2));
        assert_eq!(stats.breakdown.get("MODIFIED"), Some(&1));
        assert_eq!(stats.breakdown.get("DELETED"), Some(&1));
    }

    #[test]
    fn test_top_file_tie_goes_to_smallest_name() {
        // a.txt and b.txt both have two records.
        let stats = directory_stats_from_lines(EVENTS.lines());
        assert_eq!(stats.top_file.as_deref(), Some("a.txt"));
    }

    #[test]
    fn test_top_file_is_most_frequent() {
        let lines = [
            r#"["2026-10-16 09:00:00","DELETED","zeta"]"#,
            r#"["2026-10-16 09:00:01","DELETED","zeta"]"#,
            r#"["2026-10-16 09:00:02","DELETED","alpha"]"#,
        ];
        let stats = directory_stats_from_lines(lines);
        assert_eq!(stats.top_file.as_deref(), Some("zeta"));
    }

    #[test]
    fn test_empty_or_missing_event_log() {
        let stats = directory_stats_from_lines("".lines());
        assert_eq!(stats, DirectoryStats::default());
        assert_eq!(stats.top_file, None);

        let dir = tempdir().unwrap();
        let stats = analyze_directory_log(&dir.path().join("absent.jsonl")).unwrap();
        assert_eq!(stats.total, 0);
    }

    #[test]
    fn test_analyze_directory_log_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("directory_logs.jsonl");
        fs::write(&path, EVENTS).unwrap();
        assert_eq!(analyze_directory_log(&path).unwrap().total, 4);
    }

    #[test]
    fn test_unreadable_log_is_read_error() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            analyze_directory_log(dir.path()),
            Err(ReportError::Read { .. })
        ));
    }

    #[test]
    fn test_invalid_utf8_lines_are_skipped() {
        let dir = tempdir().unwrap();
        let events = dir.path().join("directory_logs.jsonl");
        let mut content = br#"["2026-10-16 09:00:00","DELETED","old.txt"]"#.to_vec();
        content.extend_from_slice(b"\n\xff\xfe garbage\n");
        fs::write(&events, &content).unwrap();

        let stats = analyze_directory_log(&events).unwrap();
        assert_eq!(stats.total, 1);
        assert_eq!(stats.skipped_lines, 1);
        assert_eq!(stats.top_file.as_deref(), Some("old.txt"));

        let metrics = dir.path().join("system_metrics.jsonl");
        let mut content = b"\xff\xfe garbage\r\n".to_vec();
        content.extend_from_slice(br#"{"cpu_percent":20.0,"memory_percent":30.0}"#);
        fs::write(&metrics, &content).unwrap();

        let stats = analyze_metrics_log(&metrics).unwrap();
        assert_eq!(stats.samples, 1);
        assert_eq!(stats.skipped_lines, 1);
        assert_eq!(stats.peak_cpu, 20.0);
    }

    #[test]
    fn test_utf8_lines_keeps_valid_lines_in_order() {
        let (lines, invalid) = utf8_lines(b"a\r\n\xc3\n\nb");
        assert_eq!(lines, vec!["a", "", "b"]);
        assert_eq!(invalid, 1);
    }

    #[test]
    fn test_performance_stats() {
        let lines = [
            r#"{"timestamp":"2026-10-16 09:00:00","cpu_percent":10.0,"memory_percent":40.0}"#,
            r#"{"timestamp":"2026-10-16 09:00:10","cpu_percent":50.0,"memory_percent":50.0}"#,
            "{broken",
            r#"{"timestamp":"2026-10-16 09:00:20","cpu_percent":30.0,"memory_percent":60.0}"#,
        ];
        let stats = performance_stats_from_lines(lines);
        assert_eq!(stats.samples, 3);
        assert_eq!(stats.skipped_lines, 1);
        assert!((stats.avg_cpu - 30.0).abs() < 1e-9);
        assert!((stats.avg_mem - 50.0).abs() < 1e-9);
        assert_eq!(stats.peak_cpu, 50.0);
        assert_eq!(stats.cpu_histogram.total(), 3);
        assert_eq!(stats.memory_histogram.total(), 3);
    }

    #[test]
    fn test_performance_stats_empty() {
        let stats = performance_stats_from_lines(Vec::<&str>::new());
        assert_eq!(stats.samples, 0);
        assert_eq!(stats.avg_cpu, 0.0);
        assert_eq!(stats.peak_cpu, 0.0);

        let dir = tempdir().unwrap();
        let stats = analyze_metrics_log(&dir.path().join("absent.jsonl")).unwrap();
        assert_eq!(stats.samples, 0);
    }

    #[test]
    fn test_histogram_binning() {
        let mut h = Histogram::default();
        h.add(0.0);
        h.add(6.0);
        h.add(7.0);
        h.add(100.0);
        h.add(150.0);
        h.add(-3.0);

        assert_eq!(h.bins.len(), HISTOGRAM_BINS);
        assert_eq!(h.bins[0], 3);
        assert_eq!(h.bins[1], 1);
        assert_eq!(h.bins[HISTOGRAM_BINS - 1], 2);
        assert_eq!(h.max(), 3);
        let (lo, hi) = Histogram::range(1);
        assert!((lo - 6.666).abs() < 0.01 && (hi - 13.333).abs() < 0.01);
    }
}

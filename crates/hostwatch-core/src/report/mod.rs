//! Offline summary of the event and metrics logs.

pub mod analysis;
pub mod render;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

pub use analysis::{
    DirectoryStats, HISTOGRAM_BINS, Histogram, PerformanceStats, analyze_directory_log,
    analyze_metrics_log, directory_stats_from_lines, performance_stats_from_lines,
};
pub use render::render_report;

/// A log could not be read or the report could not be written.
#[derive(Debug)]
pub enum ReportError {
    Read { path: PathBuf, source: io::Error },
    Write { path: PathBuf, source: io::Error },
}

impl std::fmt::Display for ReportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportError::Read { path, source } => {
                write!(f, "cannot read {}: {}", path.display(), source)
            }
            ReportError::Write { path, source } => {
                write!(f, "cannot write {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for ReportError {}

/// Both summaries, as emitted by `hostwatch-report --json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Report {
    pub directory: DirectoryStats,
    pub performance: PerformanceStats,
}

impl Report {
    /// Analyzes both logs. Missing logs produce empty sections.
    pub fn from_logs(event_log: &Path, metrics_log: &Path) -> Result<Self, ReportError> {
        Ok(Self {
            directory: analyze_directory_log(event_log)?,
            performance: analyze_metrics_log(metrics_log)?,
        })
    }

    pub fn render(&self) -> String {
        render_report(&self.directory, &self.performance)
    }
}

/// Writes `text` to `path`, creating parent directories and replacing any
/// previous report.
pub fn write_report(path: &Path, text: &str) -> Result<(), ReportError> {
    let write_err = |source| ReportError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    fs::write(path, text).map_err(write_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::MetricsSample;
    use crate::storage::{AppendLog, MetricsLog};
    use crate::watcher::{EventEmitter, diff, Entry, Snapshot};
    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;

    #[test]
    fn test_report_from_written_logs() {
        let dir = tempdir().unwrap();
        let event_log = dir.path().join("logs").join("directory_logs.jsonl");
        let metrics_log = dir.path().join("logs").join("system_metrics.jsonl");

        let before = Snapshot::new();
        let after: Snapshot = [("notes.md", Entry::file(3))].into_iter().collect();
        let mut emitter = EventEmitter::new(AppendLog::new(&event_log));
        let now = Utc.with_ymd_and_hms(2026, 10, 16, 7, 0, 0).unwrap();
        emitter.emit(now, &diff(&before, &after)).unwrap();
        emitter.emit(now, &diff(&after, &before)).unwrap();

        let metrics = MetricsLog::new(&metrics_log);
        for cpu in [20.0, 40.0] {
            metrics
                .append(&MetricsSample {
                    cpu_percent: cpu,
                    memory_percent: 70.0,
                    ..Default::default()
                })
                .unwrap();
        }

        let report = Report::from_logs(&event_log, &metrics_log).unwrap();
        assert_eq!(report.directory.total, 2);
        assert_eq!(report.directory.top_file.as_deref(), Some("notes.md"));
        assert_eq!(report.performance.samples, 2);
        assert!((report.performance.avg_cpu - 30.0).abs() < 1e-9);
        assert_eq!(report.performance.peak_cpu, 40.0);

        let out = dir.path().join("out").join("final_summary_report.txt");
        write_report(&out, &report.render()).unwrap();
        let text = fs::read_to_string(&out).unwrap();
        assert!(text.contains("- Most Active File: notes.md"));
    }

    #[test]
    fn test_report_json_shape() {
        let value = serde_json::to_value(Report::default()).unwrap();
        assert_eq!(value["directory"]["total"], 0);
        assert!(value["directory"]["top_file"].is_null());
        assert_eq!(
            value["performance"]["cpu_histogram"]["bins"]
                .as_array()
                .unwrap()
                .len(),
            HISTOGRAM_BINS
        );
    }

    #[test]
    fn test_write_report_into_directory_fails() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            write_report(dir.path(), "text"),
            Err(ReportError::Write { .. })
        ));
    }
}

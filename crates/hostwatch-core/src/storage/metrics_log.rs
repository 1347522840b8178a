//! Metrics sample log, one JSON object per line.

use std::path::{Path, PathBuf};

use crate::collector::MetricsSample;
use crate::storage::append_log::{AppendLog, WriteError};

/// Append-only log of metrics samples, one JSON object per line.
#[derive(Debug, Clone)]
pub struct MetricsLog {
    log: AppendLog,
}

impl MetricsLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            log: AppendLog::new(path),
        }
    }

    pub fn path(&self) -> &Path {
        self.log.path()
    }

    pub fn append(&self, sample: &MetricsSample) -> Result<(), WriteError> {
        let line = serde_json::to_string(sample)?;
        self.log.append_lines([line])?;
        Ok(())
    }
}

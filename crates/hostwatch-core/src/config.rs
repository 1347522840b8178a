//! Collector configuration with the agent's built-in defaults.

use std::path::PathBuf;
use std::time::Duration;

/// Directory watched when none is given.
pub const DEFAULT_WATCH_DIR: &str = "watched_folder";
/// Seconds between directory polls.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;
/// Directory event log location.
pub const DEFAULT_EVENT_LOG: &str = "logs/directory_logs.jsonl";
/// Consecutive failed polls before the watcher escalates to `error!`.
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 5;

/// Seconds between metrics samples.
pub const DEFAULT_METRICS_INTERVAL_SECS: u64 = 10;
/// Metrics log location.
pub const DEFAULT_METRICS_LOG: &str = "logs/system_metrics.jsonl";
/// Base path of the proc filesystem.
pub const DEFAULT_PROC_PATH: &str = "/proc";
/// Mount point whose usage is reported as disk metrics.
pub const DEFAULT_DISK_MOUNT: &str = "/";

/// Configuration for the directory watcher.
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// Directory whose immediate children are tracked.
    pub dir: PathBuf,
    /// Time between polls.
    pub interval: Duration,
    /// Append-only event log.
    pub event_log: PathBuf,
    /// Take the first snapshot as a silent baseline instead of logging every
    /// existing entry as CREATED.
    pub silent_baseline: bool,
    /// Consecutive failures before escalating. 0 disables escalation.
    pub failure_threshold: u32,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_WATCH_DIR),
            interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            event_log: PathBuf::from(DEFAULT_EVENT_LOG),
            silent_baseline: false,
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
        }
    }
}

impl WatcherConfig {
    /// Creates a config for `dir` with the remaining fields defaulted.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ..Self::default()
        }
    }
}

/// Configuration for the metrics sampler.
#[derive(Debug, Clone)]
pub struct SamplerConfig {
    pub proc_path: String,
    pub interval: Duration,
    pub metrics_log: PathBuf,
    pub disk_mount: PathBuf,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            proc_path: DEFAULT_PROC_PATH.to_string(),
            interval: Duration::from_secs(DEFAULT_METRICS_INTERVAL_SECS),
            metrics_log: PathBuf::from(DEFAULT_METRICS_LOG),
            disk_mount: PathBuf::from(DEFAULT_DISK_MOUNT),
        }
    }
}

//! Polling loop driving snapshot → diff → emit on a fixed interval.
//!
//! ```text
//!   Idle ──tick──▶ Sampling ──▶ Diffing ──▶ Emitting ──▶ Idle
//!     ▲                │                        │
//!     └──AccessError───┘          WriteError ───┘ (baseline kept)
//! ```
//!
//! The watcher owns its previous snapshot. It is replaced only after the
//! change-set was written, so a failed write makes the next tick detect (and
//! log) the same changes again. Duplicates are possible; lost changes are not.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::collector::FileSystem;
use crate::config::{DEFAULT_FAILURE_THRESHOLD, WatcherConfig};
use crate::shutdown::Shutdown;
use crate::storage::AppendLog;
use crate::watcher::diff::diff;
use crate::watcher::emitter::{EventEmitter, EventSink};
use crate::watcher::error::PollError;
use crate::watcher::snapshot::{Snapshot, capture};

/// Phase of the polling state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Sampling,
    Diffing,
    Emitting,
}

/// Outcome of one successful poll.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollReport {
    pub created: usize,
    pub deleted: usize,
    pub modified: usize,
    /// Entries that vanished between listing and stating.
    pub skipped: usize,
    /// The snapshot was taken as a silent baseline; nothing was emitted.
    pub baseline: bool,
}

impl PollReport {
    pub fn total(&self) -> usize {
        self.created + self.deleted + self.modified
    }
}

/// True when a failure streak reaches `threshold` or a multiple of it.
/// A threshold of 0 never escalates.
fn should_escalate(consecutive_failures: u32, threshold: u32) -> bool {
    threshold > 0 && consecutive_failures > 0 && consecutive_failures % threshold == 0
}

/// Watches one directory's immediate children.
pub struct DirectoryWatcher<F: FileSystem, S: EventSink> {
    fs: F,
    dir: PathBuf,
    previous: Snapshot,
    emitter: EventEmitter<S>,
    state: PollState,
    silent_baseline: bool,
    has_baseline: bool,
    failure_threshold: u32,
    consecutive_failures: u32,
    polls: u64,
}

impl<F: FileSystem> DirectoryWatcher<F, AppendLog> {
    /// Creates a watcher writing to the config's event log.
    pub fn from_config(fs: F, config: &WatcherConfig) -> Self {
        Self::new(fs, &config.dir, AppendLog::new(&config.event_log))
            .with_silent_baseline(config.silent_baseline)
            .with_failure_threshold(config.failure_threshold)
    }
}

impl<F: FileSystem, S: EventSink> DirectoryWatcher<F, S> {
    /// Creates a watcher with an empty previous snapshot.
    pub fn new(fs: F, dir: impl AsRef<Path>, sink: S) -> Self {
        Self {
            fs,
            dir: dir.as_ref().to_path_buf(),
            previous: Snapshot::new(),
            emitter: EventEmitter::new(sink),
            state: PollState::Idle,
            silent_baseline: false,
            has_baseline: false,
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            consecutive_failures: 0,
            polls: 0,
        }
    }

    /// Takes the first successful snapshot as baseline without emitting.
    pub fn with_silent_baseline(mut self, silent: bool) -> Self {
        self.silent_baseline = silent;
        self
    }

    /// Sets how many consecutive failures trigger `error!` escalation.
    /// 0 disables escalation.
    pub fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    /// Last snapshot that was durably emitted.
    pub fn previous(&self) -> &Snapshot {
        &self.previous
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn polls(&self) -> u64 {
        self.polls
    }

    pub fn fs_mut(&mut self) -> &mut F {
        &mut self.fs
    }

    pub fn sink(&self) -> &S {
        self.emitter.sink()
    }

    pub fn sink_mut(&mut self) -> &mut S {
        self.emitter.sink_mut()
    }

    /// Runs one Sampling → Diffing → Emitting cycle and returns to Idle.
    ///
    /// On success the current snapshot becomes the new baseline. On failure
    /// the baseline is left untouched.
    pub fn poll_once(&mut self, now: DateTime<Utc>) -> Result<PollReport, PollError> {
        let result = self.cycle(now);
        self.state = PollState::Idle;
        result
    }

    fn cycle(&mut self, now: DateTime<Utc>) -> Result<PollReport, PollError> {
        self.state = PollState::Sampling;
        let capture = capture(&self.fs, &self.dir)?;
        for skipped in &capture.skipped {
            debug!("{}", skipped);
        }

        self.state = PollState::Diffing;
        let changes = diff(&self.previous, &capture.snapshot);

        let mut report = PollReport {
            skipped: capture.skipped.len(),
            ..PollReport::default()
        };

        self.state = PollState::Emitting;
        if self.silent_baseline && !self.has_baseline {
            report.baseline = true;
        } else {
            self.emitter.emit(now, &changes)?;
            report.created = changes.created.len();
            report.deleted = changes.deleted.len();
            report.modified = changes.modified.len();
        }

        self.previous = capture.snapshot;
        self.has_baseline = true;
        Ok(report)
    }

    /// Polls once, logging the outcome and tracking consecutive failures.
    ///
    /// Returns `true` if the poll succeeded.
    pub fn tick(&mut self, now: DateTime<Utc>) -> bool {
        self.polls += 1;
        match self.poll_once(now) {
            Ok(report) => {
                if self.consecutive_failures > 0 {
                    info!(
                        "Directory watch recovered after {} failed polls",
                        self.consecutive_failures
                    );
                }
                self.consecutive_failures = 0;
                self.log_report(&report);
                true
            }
            Err(e) => {
                self.consecutive_failures += 1;
                if should_escalate(self.consecutive_failures, self.failure_threshold) {
                    error!(
                        "Directory watch of {} failing for {} consecutive polls: {}",
                        self.dir.display(),
                        self.consecutive_failures,
                        e
                    );
                } else {
                    warn!("Poll #{} of {} failed: {}", self.polls, self.dir.display(), e);
                }
                false
            }
        }
    }

    fn log_report(&self, report: &PollReport) {
        if report.baseline {
            info!(
                "Baseline of {} taken ({} entries)",
                self.dir.display(),
                self.previous.len()
            );
        } else if report.total() > 0 {
            info!(
                "Poll #{}: {} created, {} deleted, {} modified",
                self.polls, report.created, report.deleted, report.modified
            );
        } else {
            debug!("Poll #{}: no changes", self.polls);
        }
        if report.skipped > 0 {
            debug!("Poll #{}: {} entries vanished while scanning", self.polls, report.skipped);
        }
    }

    /// Polls every `interval` until `shutdown` is triggered.
    ///
    /// The stop flag is only checked between cycles.
    pub fn run(&mut self, interval: Duration, shutdown: &Shutdown) {
        info!(
            "Watching {} (interval: {:?})",
            self.dir.display(),
            interval
        );

        while !shutdown.is_triggered() {
            self.tick(Utc::now());
            shutdown.sleep(interval);
        }

        info!(
            "Directory watcher for {} stopped after {} polls",
            self.dir.display(),
            self.polls
        );
    }
}

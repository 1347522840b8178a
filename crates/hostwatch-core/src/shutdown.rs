//! Cooperative stop flag for the collector loops.
//!
//! Loops check the flag only between cycles, so a poll that has started
//! always runs to completion.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Granularity of the interruptible sleep.
const SLEEP_SLICE: Duration = Duration::from_millis(100);

/// Shared, cloneable stop signal.
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    triggered: Arc<AtomicBool>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests every loop holding a clone of this token to stop.
    pub fn trigger(&self) {
        self.triggered.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }

    /// Sleeps for `duration` in short slices, returning early once triggered.
    ///
    /// Returns `true` if the sleep was cut short by a shutdown request.
    pub fn sleep(&self, duration: Duration) -> bool {
        let mut remaining = duration;
        while remaining > Duration::ZERO && !self.is_triggered() {
            let slice = remaining.min(SLEEP_SLICE);
            std::thread::sleep(slice);
            remaining = remaining.saturating_sub(slice);
        }
        self.is_triggered()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_clones_share_flag() {
        let shutdown = Shutdown::new();
        let other = shutdown.clone();
        assert!(!other.is_triggered());
        shutdown.trigger();
        assert!(other.is_triggered());
    }

    #[test]
    fn test_sleep_returns_early_when_triggered() {
        let shutdown = Shutdown::new();
        shutdown.trigger();
        let start = Instant::now();
        assert!(shutdown.sleep(Duration::from_secs(30)));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_sleep_wakes_on_trigger_from_other_thread() {
        let shutdown = Shutdown::new();
        let remote = shutdown.clone();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(150));
            remote.trigger();
        });
        let start = Instant::now();
        assert!(shutdown.sleep(Duration::from_secs(30)));
        assert!(start.elapsed() < Duration::from_secs(5));
        handle.join().unwrap();
    }

    #[test]
    fn test_sleep_full_duration_without_trigger() {
        let shutdown = Shutdown::new();
        assert!(!shutdown.sleep(Duration::from_millis(20)));
    }
}

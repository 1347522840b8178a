//! hostwatch-core - shared library for the hostwatch agent.
//!
//! Provides:
//! - `watcher` - directory snapshots, differencing, event records and the polling loop
//! - `collector` - filesystem abstraction and the `/proc` metrics sampler
//! - `storage` - append-only JSON Lines logs
//! - `report` - offline analysis of finished logs and the text report
//! - `config` - typed defaults for both collectors
//! - `shutdown` - cooperative stop flag shared by the collector loops

pub mod collector;
pub mod config;
pub mod report;
pub mod shutdown;
pub mod storage;
pub mod watcher;

/// Timestamp layout used in every log line (UTC).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

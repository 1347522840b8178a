//! Append-only JSON Lines logs written by the collectors.

pub mod append_log;
pub mod metrics_log;

pub use append_log::{AppendLog, WriteError};
pub use metrics_log::MetricsLog;

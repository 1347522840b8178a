//! Host data collection behind a mockable filesystem.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  ┌────────────────────────┐   ┌───────────────────────────┐  │
//! │  │   DirectoryWatcher     │   │     MetricsSampler        │  │
//! │  │  - read_dir + stat     │   │  - /proc/stat, meminfo    │  │
//! │  │    of watched dir      │   │  - /proc/[pid]/stat       │  │
//! │  └──────────┬─────────────┘   │  - DiskSource (sysinfo)   │  │
//! │             │                 └─────────────┬─────────────┘  │
//! │             └──────────────┬────────────────┘                │
//! │                     ┌──────▼──────┐                          │
//! │                     │  FileSystem │ (trait)                  │
//! │                     └──────┬──────┘                          │
//! └────────────────────────────┼─────────────────────────────────┘
//!                   ┌──────────┴──────────┐
//!            ┌──────▼──────┐       ┌──────▼──────┐
//!            │   RealFs    │       │   MockFs    │
//!            │  (std::fs)  │       │  (Testing)  │
//!            └─────────────┘       └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```
//! use hostwatch_core::collector::{MetricsSampler, MockFs};
//!
//! let mut fs = MockFs::new();
//! fs.add_file("/proc/stat", "cpu  10 0 10 80 0 0 0 0\n");
//! fs.add_file("/proc/meminfo", "MemTotal: 1000 kB\nMemAvailable: 500 kB\n");
//! fs.add_file("/proc/uptime", "100.0 50.0\n");
//!
//! let mut sampler = MetricsSampler::new(fs, "/proc");
//! let sample = sampler.sample(chrono::Utc::now()).unwrap();
//! assert_eq!(sample.memory_percent, 50.0);
//! ```

pub mod mock;
pub mod procfs;
pub mod sampler;
pub mod traits;

pub use mock::MockFs;
pub use procfs::ParseError;
pub use sampler::{CollectError, DiskSource, DiskUsage, MetricsSample, MetricsSampler, SysinfoDisks};
pub use traits::{FileSystem, RealFs};

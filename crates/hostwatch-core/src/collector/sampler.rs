//! Periodic host metrics sampling from `/proc` and the root filesystem.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sysinfo::Disks;
use tracing::{debug, info, warn};

use crate::TIMESTAMP_FORMAT;
use crate::collector::procfs::{
    CpuStat, ParseError, parse_cpu_total, parse_loadavg, parse_meminfo, parse_process_state,
    parse_uptime,
};
use crate::collector::traits::FileSystem;
use crate::config::{DEFAULT_DISK_MOUNT, SamplerConfig};
use crate::shutdown::Shutdown;
use crate::storage::MetricsLog;

/// Error type for metrics collection.
#[derive(Debug)]
pub enum CollectError {
    /// I/O error reading a `/proc` file.
    Io(std::io::Error),
    /// Parse error in a `/proc` file.
    Parse(String),
}

impl std::fmt::Display for CollectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectError::Io(e) => write!(f, "I/O error: {}", e),
            CollectError::Parse(msg) => write!(f, "parse error: {}", msg),
        }
    }
}

impl std::error::Error for CollectError {}

impl From<std::io::Error> for CollectError {
    fn from(e: std::io::Error) -> Self {
        CollectError::Io(e)
    }
}

impl From<ParseError> for CollectError {
    fn from(e: ParseError) -> Self {
        CollectError::Parse(e.message)
    }
}

/// One row of the metrics log. Memory and disk figures are in bytes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSample {
    pub timestamp: String,
    pub cpu_percent: f64,
    pub load_1min: Option<f64>,
    pub load_5min: Option<f64>,
    pub load_15min: Option<f64>,
    pub memory_total: u64,
    pub memory_used: u64,
    pub memory_available: u64,
    pub memory_percent: f64,
    pub disk_total: u64,
    pub disk_used: u64,
    pub disk_free: u64,
    pub disk_percent: f64,
    pub uptime_seconds: f64,
    pub system_idle_percent: f64,
    pub total_processes: u32,
    pub running_processes: u32,
    pub sleeping_processes: u32,
}

/// Space usage of one mounted filesystem, in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DiskUsage {
    pub total: u64,
    pub available: u64,
}

impl DiskUsage {
    pub fn used(&self) -> u64 {
        self.total.saturating_sub(self.available)
    }

    pub fn used_percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.used() as f64 / self.total as f64 * 100.0
    }
}

/// Source of filesystem usage figures.
pub trait DiskSource: Send {
    /// Usage of the filesystem mounted at `mount`, if it is known.
    fn usage(&mut self, mount: &Path) -> Option<DiskUsage>;
}

/// [`DiskSource`] backed by `sysinfo`.
pub struct SysinfoDisks {
    disks: Disks,
}

impl SysinfoDisks {
    pub fn new() -> Self {
        Self {
            disks: Disks::new_with_refreshed_list(),
        }
    }
}

impl Default for SysinfoDisks {
    fn default() -> Self {
        Self::new()
    }
}

impl DiskSource for SysinfoDisks {
    fn usage(&mut self, mount: &Path) -> Option<DiskUsage> {
        self.disks.refresh(true);
        self.disks
            .iter()
            .find(|disk| disk.mount_point() == mount)
            .map(|disk| DiskUsage {
                total: disk.total_space(),
                available: disk.available_space(),
            })
    }
}

/// Samples CPU, load, memory, uptime, process and disk metrics.
pub struct MetricsSampler<F: FileSystem> {
    fs: F,
    proc_path: String,
    disk_source: Option<Box<dyn DiskSource>>,
    disk_mount: PathBuf,
    prev_cpu: Option<CpuStat>,
    samples: u64,
}

impl<F: FileSystem> MetricsSampler<F> {
    /// Creates a sampler without a disk source.
    ///
    /// # Arguments
    /// * `fs` - Filesystem implementation (real or mock)
    /// * `proc_path` - Base path to proc filesystem (usually "/proc")
    pub fn new(fs: F, proc_path: impl Into<String>) -> Self {
        Self {
            fs,
            proc_path: proc_path.into(),
            disk_source: None,
            disk_mount: PathBuf::from(DEFAULT_DISK_MOUNT),
            prev_cpu: None,
            samples: 0,
        }
    }

    /// Creates a sampler from config, reporting disk usage through `sysinfo`.
    pub fn from_config(fs: F, config: &SamplerConfig) -> Self {
        Self::new(fs, config.proc_path.clone())
            .with_disk_source(SysinfoDisks::new())
            .with_disk_mount(&config.disk_mount)
    }

    pub fn with_disk_source(mut self, source: impl DiskSource + 'static) -> Self {
        self.disk_source = Some(Box::new(source));
        self
    }

    pub fn with_disk_mount(mut self, mount: impl AsRef<Path>) -> Self {
        self.disk_mount = mount.as_ref().to_path_buf();
        self
    }

    pub fn samples(&self) -> u64 {
        self.samples
    }

    fn read(&self, name: &str) -> Result<String, CollectError> {
        let path = format!("{}/{}", self.proc_path, name);
        Ok(self.fs.read_to_string(Path::new(&path))?)
    }

    /// Takes one sample.
    ///
    /// CPU and idle percentages cover the time since the previous successful
    /// sample; the first sample covers the time since boot.
    pub fn sample(&mut self, now: DateTime<Utc>) -> Result<MetricsSample, CollectError> {
        let cpu = parse_cpu_total(&self.read("stat")?)?;
        let (cpu_percent, system_idle_percent) =
            cpu.usage_since(&self.prev_cpu.unwrap_or_default());

        let mem = parse_meminfo(&self.read("meminfo")?)?;
        let uptime_seconds = parse_uptime(&self.read("uptime")?)?;

        let load = match self.read("loadavg") {
            Ok(content) => parse_loadavg(&content)
                .inspect_err(|e| debug!("Ignoring loadavg: {}", e))
                .ok(),
            Err(e) => {
                debug!("No load average available: {}", e);
                None
            }
        };

        let (total_processes, running_processes, sleeping_processes) = self.count_processes()?;

        let disk = match self.disk_source.as_mut() {
            Some(source) => source.usage(&self.disk_mount),
            None => None,
        };
        if disk.is_none() && self.disk_source.is_some() {
            debug!("No disk usage for {}", self.disk_mount.display());
        }
        let disk = disk.unwrap_or_default();

        self.prev_cpu = Some(cpu);
        self.samples += 1;

        Ok(MetricsSample {
            timestamp: now.format(TIMESTAMP_FORMAT).to_string(),
            cpu_percent,
            load_1min: load.as_ref().map(|l| l.load1),
            load_5min: load.as_ref().map(|l| l.load5),
            load_15min: load.as_ref().map(|l| l.load15),
            memory_total: mem.mem_total * 1024,
            memory_used: mem.used() * 1024,
            memory_available: mem.mem_available * 1024,
            memory_percent: mem.used_percent(),
            disk_total: disk.total,
            disk_used: disk.used(),
            disk_free: disk.available,
            disk_percent: disk.used_percent(),
            uptime_seconds,
            system_idle_percent,
            total_processes,
            running_processes,
            sleeping_processes,
        })
    }

    /// Counts processes and their running/sleeping states.
    ///
    /// Processes that disappear during the scan are skipped.
    fn count_processes(&self) -> Result<(u32, u32, u32), CollectError> {
        let entries = self.fs.read_dir(Path::new(&self.proc_path))?;
        let (mut total, mut running, mut sleeping) = (0u32, 0u32, 0u32);

        for entry in entries {
            if let Some(name) = entry.file_name().and_then(|n| n.to_str())
                && name.parse::<u32>().is_ok()
            {
                let Ok(content) = self.fs.read_to_string(&entry.join("stat")) else {
                    continue;
                };
                total += 1;
                match parse_process_state(&content) {
                    Ok('R') => running += 1,
                    Ok('S') => sleeping += 1,
                    Ok(_) => {}
                    Err(e) => debug!("Process {}: {}", name, e),
                }
            }
        }

        Ok((total, running, sleeping))
    }

    /// Samples every `interval` and appends to `log` until `shutdown` is
    /// triggered. Failed samples and writes are logged and skipped.
    pub fn run(&mut self, interval: Duration, shutdown: &Shutdown, log: &MetricsLog) {
        info!(
            "Sampling metrics every {:?} into {}",
            interval,
            log.path().display()
        );

        while !shutdown.is_triggered() {
            match self.sample(Utc::now()) {
                Ok(sample) => {
                    info!(
                        "CPU {:.1}% | memory {:.1}% | disk {:.1}% | processes {} ({} running)",
                        sample.cpu_percent,
                        sample.memory_percent,
                        sample.disk_percent,
                        sample.total_processes,
                        sample.running_processes
                    );
                    if let Err(e) = log.append(&sample) {
                        warn!("Failed to write metrics sample: {}", e);
                    }
                }
                Err(e) => warn!("Failed to sample metrics: {}", e),
            }
            shutdown.sleep(interval);
        }

        info!("Metrics sampler stopped after {} samples", self.samples);
    }
}

//! hostwatchd - directory change and host metrics monitoring daemon.
//!
//! Runs the directory watcher and the metrics sampler on their own threads
//! until SIGINT/SIGTERM, then optionally writes a summary report.

use std::path::{Path, PathBuf};
use std::thread::JoinHandle;
use std::time::Duration;

use clap::Parser;
use tracing::{Level, error, info, warn};
use tracing_subscriber::EnvFilter;

use hostwatch_core::collector::{MetricsSampler, RealFs};
use hostwatch_core::config::{
    DEFAULT_EVENT_LOG, DEFAULT_FAILURE_THRESHOLD, DEFAULT_METRICS_INTERVAL_SECS,
    DEFAULT_METRICS_LOG, DEFAULT_POLL_INTERVAL_SECS, DEFAULT_PROC_PATH, DEFAULT_WATCH_DIR,
    SamplerConfig, WatcherConfig,
};
use hostwatch_core::report::{Report, ReportError, write_report};
use hostwatch_core::shutdown::Shutdown;
use hostwatch_core::storage::MetricsLog;
use hostwatch_core::watcher::DirectoryWatcher;

/// Directory change and host metrics monitoring daemon.
#[derive(Parser, Debug)]
#[command(
    name = "hostwatchd",
    about = "Directory change and host metrics monitoring daemon",
    version
)]
struct Args {
    /// Directory whose immediate children are watched.
    #[arg(short, long, env = "HOSTWATCH_DIR", default_value = DEFAULT_WATCH_DIR)]
    dir: PathBuf,

    /// Seconds between directory polls.
    #[arg(
        short,
        long,
        env = "HOSTWATCH_INTERVAL",
        default_value_t = DEFAULT_POLL_INTERVAL_SECS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    interval: u64,

    /// Append-only directory event log.
    #[arg(long, env = "HOSTWATCH_EVENT_LOG", default_value = DEFAULT_EVENT_LOG)]
    event_log: PathBuf,

    /// Append-only metrics log.
    #[arg(long, env = "HOSTWATCH_METRICS_LOG", default_value = DEFAULT_METRICS_LOG)]
    metrics_log: PathBuf,

    /// Seconds between metrics samples.
    #[arg(
        long,
        env = "HOSTWATCH_METRICS_INTERVAL",
        default_value_t = DEFAULT_METRICS_INTERVAL_SECS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    metrics_interval: u64,

    /// Only watch the directory; do not sample host metrics.
    #[arg(long)]
    no_metrics: bool,

    /// Path to /proc filesystem (for testing).
    #[arg(long, default_value = DEFAULT_PROC_PATH)]
    proc_path: String,

    /// Record the entries present at startup as a baseline instead of
    /// logging each of them as CREATED.
    #[arg(long)]
    silent_baseline: bool,

    /// Consecutive failed polls before errors are escalated (0 disables).
    #[arg(long, default_value_t = DEFAULT_FAILURE_THRESHOLD)]
    failure_threshold: u32,

    /// Write a summary report of both logs to PATH on shutdown.
    #[arg(long, value_name = "PATH")]
    report: Option<PathBuf>,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is info level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,
}

impl Args {
    fn watcher_config(&self) -> WatcherConfig {
        WatcherConfig {
            dir: self.dir.clone(),
            interval: Duration::from_secs(self.interval),
            event_log: self.event_log.clone(),
            silent_baseline: self.silent_baseline,
            failure_threshold: self.failure_threshold,
        }
    }

    fn sampler_config(&self) -> SamplerConfig {
        SamplerConfig {
            proc_path: self.proc_path.clone(),
            interval: Duration::from_secs(self.metrics_interval),
            metrics_log: self.metrics_log.clone(),
            ..SamplerConfig::default()
        }
    }
}

/// Initializes the tracing subscriber with the appropriate log level.
/// Default level is INFO. Use -q for quiet mode (errors only).
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(format!("hostwatchd={}", level).parse().expect("valid directive"))
        .add_directive(format!("hostwatch_core={}", level).parse().expect("valid directive"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn spawn_watcher(config: WatcherConfig, shutdown: Shutdown) -> std::io::Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name("dir-watcher".into())
        .spawn(move || {
            let mut watcher = DirectoryWatcher::from_config(RealFs::new(), &config);
            watcher.run(config.interval, &shutdown);
        })
}

fn spawn_sampler(config: SamplerConfig, shutdown: Shutdown) -> std::io::Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name("metrics-sampler".into())
        .spawn(move || {
            let log = MetricsLog::new(&config.metrics_log);
            let mut sampler = MetricsSampler::from_config(RealFs::new(), &config);
            sampler.run(config.interval, &shutdown, &log);
        })
}

/// Analyzes both logs and writes the text report.
fn write_exit_report(event_log: &Path, metrics_log: &Path, output: &Path) -> Result<(), ReportError> {
    let report = Report::from_logs(event_log, metrics_log)?;
    write_report(output, &report.render())?;
    info!(
        "Report written to {} ({} events, {} samples)",
        output.display(),
        report.directory.total,
        report.performance.samples
    );
    Ok(())
}

fn main() {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    info!("hostwatchd {} starting", env!("CARGO_PKG_VERSION"));
    let watcher_config = args.watcher_config();
    let sampler_config = args.sampler_config();
    info!(
        "Config: dir={}, interval={}s, event_log={}",
        watcher_config.dir.display(),
        args.interval,
        watcher_config.event_log.display()
    );
    if !watcher_config.dir.is_dir() {
        warn!(
            "Watched directory {} does not exist; polls will fail until it is created",
            watcher_config.dir.display()
        );
    }

    let metrics_enabled = !args.no_metrics && cfg!(target_os = "linux");
    if metrics_enabled {
        info!(
            "Metrics: interval={}s, log={}, proc={}",
            args.metrics_interval,
            sampler_config.metrics_log.display(),
            sampler_config.proc_path
        );
    } else if args.no_metrics {
        info!("Metrics sampler: disabled");
    } else {
        warn!("Metrics sampler: disabled (requires Linux /proc)");
    }

    // Setup graceful shutdown
    let shutdown = Shutdown::new();
    let s = shutdown.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        s.trigger();
    }) {
        warn!("Failed to set Ctrl-C handler: {}", e);
    }

    let mut handles = Vec::new();
    match spawn_watcher(watcher_config, shutdown.clone()) {
        Ok(handle) => handles.push(handle),
        Err(e) => {
            error!("Failed to start directory watcher: {}", e);
            std::process::exit(1);
        }
    }
    if metrics_enabled {
        match spawn_sampler(sampler_config, shutdown.clone()) {
            Ok(handle) => handles.push(handle),
            Err(e) => error!("Failed to start metrics sampler: {}", e),
        }
    }

    for handle in handles {
        let name = handle.thread().name().unwrap_or("collector").to_string();
        if handle.join().is_err() {
            error!("Thread {} panicked", name);
        }
    }

    if let Some(output) = &args.report
        && let Err(e) = write_exit_report(&args.event_log, &args.metrics_log, output)
    {
        error!("Failed to write report: {}", e);
    }

    info!("hostwatchd stopped");
}

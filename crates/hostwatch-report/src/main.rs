use std::path::{Path, PathBuf};

use clap::Parser;
use serde::Serialize;
use tracing::{Level, debug, error};
use tracing_subscriber::EnvFilter;

use hostwatch_core::config::{DEFAULT_EVENT_LOG, DEFAULT_METRICS_LOG};
use hostwatch_core::report::{Report, write_report};

// ── CLI ──────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "hostwatch-report",
    about = "Summarize hostwatch event and metrics logs"
)]
struct Cli {
    /// Directory event log (JSON Lines)
    #[arg(long, default_value = DEFAULT_EVENT_LOG)]
    event_log: PathBuf,

    /// Metrics log (JSON Lines)
    #[arg(long, default_value = DEFAULT_METRICS_LOG)]
    metrics_log: PathBuf,

    /// Write the report to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

// ── JSON output types ────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ReportJson<'a> {
    event_log: String,
    metrics_log: String,
    #[serde(flatten)]
    report: &'a Report,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("hostwatch_report={}", level).parse().expect("valid directive"))
        .add_directive(format!("hostwatch_core={}", level).parse().expect("valid directive"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn render(cli: &Cli, report: &Report) -> Result<String, serde_json::Error> {
    if cli.json {
        serde_json::to_string_pretty(&ReportJson {
            event_log: cli.event_log.display().to_string(),
            metrics_log: cli.metrics_log.display().to_string(),
            report,
        })
    } else {
        Ok(report.render())
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let report = Report::from_logs(&cli.event_log, &cli.metrics_log)?;
    debug!(
        "{} events, {} samples",
        report.directory.total, report.performance.samples
    );
    let text = render(cli, &report)?;

    match &cli.output {
        Some(path) => write_report(Path::new(path), &text)?,
        None => println!("{}", text),
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(&cli) {
        error!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("hostwatch-report").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn json_output_includes_log_paths_and_sections() {
        let cli = cli(&["--json", "--event-log", "a.jsonl", "--metrics-log", "b.jsonl"]);
        let text = render(&cli, &Report::default()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["event_log"], "a.jsonl");
        assert_eq!(value["metrics_log"], "b.jsonl");
        assert_eq!(value["directory"]["total"], 0);
        assert_eq!(value["performance"]["samples"], 0);
    }

    #[test]
    fn text_output_is_rendered_report() {
        let cli = cli(&[]);
        assert_eq!(cli.event_log, PathBuf::from(DEFAULT_EVENT_LOG));
        let text = render(&cli, &Report::default()).unwrap();
        assert!(text.starts_with("====="));
        assert!(text.contains("[SECTION 2: SYSTEM PERFORMANCE]"));
    }
}

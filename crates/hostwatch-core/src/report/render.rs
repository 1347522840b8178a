//! Plain-text rendering of the summary report.

use std::fmt::Write;

use crate::report::analysis::{DirectoryStats, Histogram, PerformanceStats};

const RULE_WIDTH: usize = 50;
const BAR_WIDTH: usize = 40;

/// Renders the three-section text report.
pub fn render_report(dir: &DirectoryStats, perf: &PerformanceStats) -> String {
    let mut out = String::new();
    let rule = "=".repeat(RULE_WIDTH);

    // Writing to a String cannot fail.
    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out, "{:^width$}", "HOST MONITORING SUMMARY REPORT", width = RULE_WIDTH);
    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out);

    let _ = writeln!(out, "[SECTION 1: DIRECTORY ACTIVITY]");
    let _ = writeln!(out, "- Total File Events: {}", dir.total);
    for (kind, count) in &dir.breakdown {
        let _ = writeln!(out, "  * {}: {}", kind, count);
    }
    let _ = writeln!(
        out,
        "- Most Active File: {}",
        dir.top_file.as_deref().unwrap_or("N/A")
    );
    if dir.skipped_lines > 0 {
        let _ = writeln!(out, "- Unreadable Lines Skipped: {}", dir.skipped_lines);
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "[SECTION 2: SYSTEM PERFORMANCE]");
    let _ = writeln!(out, "- Samples: {}", perf.samples);
    let _ = writeln!(out, "- Average CPU Usage: {:.2}%", perf.avg_cpu);
    let _ = writeln!(out, "- Average RAM Usage: {:.2}%", perf.avg_mem);
    let _ = writeln!(out, "- Highest CPU Peak: {:.2}%", perf.peak_cpu);
    if perf.skipped_lines > 0 {
        let _ = writeln!(out, "- Unreadable Lines Skipped: {}", perf.skipped_lines);
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "[SECTION 3: DISTRIBUTION]");
    if perf.samples == 0 {
        let _ = writeln!(out, "- No samples recorded");
    } else {
        render_histogram(&mut out, "CPU Usage (%)", &perf.cpu_histogram, perf.avg_cpu);
        let _ = writeln!(out);
        render_histogram(&mut out, "Memory Usage (%)", &perf.memory_histogram, perf.avg_mem);
    }
    let _ = writeln!(out);
    let _ = write!(out, "Analysis Complete.");

    out
}

fn render_histogram(out: &mut String, title: &str, histogram: &Histogram, avg: f64) {
    let _ = writeln!(out, "{} (avg {:.1}%)", title, avg);
    let max = histogram.max();
    for (idx, &count) in histogram.bins.iter().enumerate() {
        let (lo, hi) = Histogram::range(idx);
        let _ = writeln!(
            out,
            "  {:>5.1} - {:>5.1} | {:<width$} {}",
            lo,
            hi,
            bar(count, max),
            count,
            width = BAR_WIDTH
        );
    }
}

/// Bar proportional to `count / max`; any non-zero count gets at least one cell.
fn bar(count: u64, max: u64) -> String {
    if count == 0 || max == 0 {
        return String::new();
    }
    let len = ((count as f64 / max as f64) * BAR_WIDTH as f64).round() as usize;
    "#".repeat(len.max(1))
}

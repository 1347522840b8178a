//! Parsers for the `/proc` files the metrics sampler reads.
//!
//! Pure functions over file contents, testable with string inputs.

/// Error type for parsing failures.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Parse error: {}", self.message)
    }
}

impl std::error::Error for ParseError {}

/// Memory figures from `/proc/meminfo`, in kB.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemInfo {
    pub mem_total: u64,
    pub mem_free: u64,
    pub mem_available: u64,
}

impl MemInfo {
    /// Memory in use: total minus available.
    pub fn used(&self) -> u64 {
        self.mem_total.saturating_sub(self.mem_available)
    }

    /// Used memory as a percentage of total, 0 if total is unknown.
    pub fn used_percent(&self) -> f64 {
        if self.mem_total == 0 {
            return 0.0;
        }
        self.used() as f64 / self.mem_total as f64 * 100.0
    }
}

/// Parses `/proc/meminfo` content.
///
/// Kernels older than 3.14 lack `MemAvailable`; `MemFree` stands in for it.
pub fn parse_meminfo(content: &str) -> Result<MemInfo, ParseError> {
    let mut info = MemInfo::default();
    let mut has_available = false;

    let parse_kb = |line: &str| -> u64 {
        line.split_whitespace()
            .nth(1)
            .and_then(|s| s.parse().ok())
            .unwrap_or(0)
    };

    for line in content.lines() {
        if line.starts_with("MemTotal:") {
            info.mem_total = parse_kb(line);
        } else if line.starts_with("MemFree:") {
            info.mem_free = parse_kb(line);
        } else if line.starts_with("MemAvailable:") {
            info.mem_available = parse_kb(line);
            has_available = true;
        }
    }

    if info.mem_total == 0 {
        return Err(ParseError::new("missing MemTotal in meminfo"));
    }
    if !has_available {
        info.mem_available = info.mem_free;
    }

    Ok(info)
}

/// Aggregate CPU jiffies from the `cpu` line of `/proc/stat`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CpuStat {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
}

impl CpuStat {
    pub fn total(&self) -> u64 {
        self.user
            + self.nice
            + self.system
            + self.idle
            + self.iowait
            + self.irq
            + self.softirq
            + self.steal
    }

    /// Jiffies spent idle, including waiting for I/O.
    pub fn idle_total(&self) -> u64 {
        self.idle + self.iowait
    }

    /// Busy and idle percentages between `prev` and `self`.
    ///
    /// Returns `(0.0, 100.0)` when no time elapsed.
    pub fn usage_since(&self, prev: &CpuStat) -> (f64, f64) {
        let total = self.total().saturating_sub(prev.total());
        if total == 0 {
            return (0.0, 100.0);
        }
        let idle = self.idle_total().saturating_sub(prev.idle_total()).min(total);
        let idle_percent = idle as f64 / total as f64 * 100.0;
        (100.0 - idle_percent, idle_percent)
    }
}

/// Parses the aggregate `cpu` line of `/proc/stat`.
///
/// Guest time is already accounted in user/nice and is not summed again.
pub fn parse_cpu_total(content: &str) -> Result<CpuStat, ParseError> {
    let line = content
        .lines()
        .find(|l| l.split_whitespace().next() == Some("cpu"))
        .ok_or_else(|| ParseError::new("missing aggregate cpu line in stat"))?;

    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 5 {
        return Err(ParseError::new(format!(
            "not enough cpu fields: expected 4+, got {}",
            parts.len() - 1
        )));
    }
    let get_val = |idx: usize| -> u64 { parts.get(idx).and_then(|s| s.parse().ok()).unwrap_or(0) };

    Ok(CpuStat {
        user: get_val(1),
        nice: get_val(2),
        system: get_val(3),
        idle: get_val(4),
        iowait: get_val(5),
        irq: get_val(6),
        softirq: get_val(7),
        steal: get_val(8),
    })
}

/// Parsed data from `/proc/loadavg`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadAvg {
    pub load1: f64,
    pub load5: f64,
    pub load15: f64,
}

/// Parses `/proc/loadavg` content.
pub fn parse_loadavg(content: &str) -> Result<LoadAvg, ParseError> {
    let parts: Vec<&str> = content.split_whitespace().collect();
    if parts.len() < 3 {
        return Err(ParseError::new("invalid loadavg format"));
    }

    let load1 = parts[0]
        .parse()
        .map_err(|_| ParseError::new("invalid load1"))?;
    let load5 = parts[1]
        .parse()
        .map_err(|_| ParseError::new("invalid load5"))?;
    let load15 = parts[2]
        .parse()
        .map_err(|_| ParseError::new("invalid load15"))?;

    Ok(LoadAvg {
        load1,
        load5,
        load15,
    })
}

/// Parses `/proc/uptime` and returns seconds since boot.
pub fn parse_uptime(content: &str) -> Result<f64, ParseError> {
    content
        .split_whitespace()
        .next()
        .ok_or_else(|| ParseError::new("empty uptime"))?
        .parse()
        .map_err(|_| ParseError::new("invalid uptime"))
}

/// Extracts the state letter from `/proc/[pid]/stat`.
///
/// The comm field may contain spaces and parentheses, so the state is the
/// first field after the last `)`.
pub fn parse_process_state(content: &str) -> Result<char, ParseError> {
    let close_paren = content
        .rfind(')')
        .ok_or_else(|| ParseError::new("missing ')' in stat"))?;
    content[close_paren + 1..]
        .split_whitespace()
        .next()
        .and_then(|s| s.chars().next())
        .ok_or_else(|| ParseError::new("missing state in stat"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_meminfo() {
        let content = "\
MemTotal:       16384000 kB
MemFree:         8192000 kB
MemAvailable:   12288000 kB
Buffers:          512000 kB
Cached:          2048000 kB
";
        let info = parse_meminfo(content).unwrap();

        assert_eq!(info.mem_total, 16384000);
        assert_eq!(info.mem_free, 8192000);
        assert_eq!(info.mem_available, 12288000);
        assert_eq!(info.used(), 4096000);
        assert!((info.used_percent() - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_parse_meminfo_without_available_falls_back_to_free() {
        let content = "MemTotal: 1000 kB\nMemFree: 400 kB\n";
        let info = parse_meminfo(content).unwrap();
        assert_eq!(info.mem_available, 400);
        assert_eq!(info.used(), 600);
    }

    #[test]
    fn test_parse_meminfo_missing_total() {
        assert!(parse_meminfo("MemFree: 400 kB\n").is_err());
    }

    #[test]
    fn test_parse_cpu_total() {
        let content = "\
cpu  10000 500 3000 80000 1000 200 100 0 0 0
cpu0 2500 125 750 20000 250 50 25 0 0 0
ctxt 500000
";
        let cpu = parse_cpu_total(content).unwrap();
        assert_eq!(cpu.user, 10000);
        assert_eq!(cpu.idle, 80000);
        assert_eq!(cpu.iowait, 1000);
        assert_eq!(cpu.total(), 94800);
        assert_eq!(cpu.idle_total(), 81000);
    }

    #[test]
    fn test_parse_cpu_total_missing_line() {
        assert!(parse_cpu_total("cpu0 1 2 3 4\n").is_err());
        assert!(parse_cpu_total("cpu 1 2\n").is_err());
    }

    #[test]
    fn test_cpu_usage_since() {
        let prev = CpuStat {
            user: 100,
            idle: 300,
            ..CpuStat::default()
        };
        let curr = CpuStat {
            user: 175,
            idle: 325,
            ..CpuStat::default()
        };
        let (busy, idle) = curr.usage_since(&prev);
        assert!((busy - 75.0).abs() < 1e-9);
        assert!((idle - 25.0).abs() < 1e-9);

        assert_eq!(curr.usage_since(&curr), (0.0, 100.0));
    }

    #[test]
    fn test_parse_loadavg() {
        let load = parse_loadavg("0.15 0.10 0.05 1/150 1234\n").unwrap();
        assert!((load.load1 - 0.15).abs() < 0.001);
        assert!((load.load5 - 0.10).abs() < 0.001);
        assert!((load.load15 - 0.05).abs() < 0.001);

        assert!(parse_loadavg("0.15 abc 0.05 1/150 1234").is_err());
        assert!(parse_loadavg("").is_err());
    }

    #[test]
    fn test_parse_uptime() {
        assert!((parse_uptime("12345.67 45678.90\n").unwrap() - 12345.67).abs() < 1e-9);
        assert!(parse_uptime("").is_err());
        assert!(parse_uptime("soon").is_err());
    }

    #[test]
    fn test_parse_process_state() {
        assert_eq!(
            parse_process_state("1234 (bash) S 1 1234 1234 0 -1").unwrap(),
            'S'
        );
        assert_eq!(
            parse_process_state("42 (my (weird) proc) R 1 42").unwrap(),
            'R'
        );
        assert!(parse_process_state("1234 bash S").is_err());
        assert!(parse_process_state("1234 (bash)").is_err());
    }
}

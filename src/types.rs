use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

/// How per-project results are written to stdout.
///
/// - `Text`: one human-readable line per project, plus captured output for
///   failures (default).
/// - `Json`: one JSON object per line as results arrive, followed by a summary
///   object. Suitable for piping into other tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Text,
    Json,
}

impl Default for ReportFormat {
    fn default() -> Self {
        ReportFormat::Text
    }
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            other => Err(format!(
                "invalid report format: {other} (expected \"text\" or \"json\")"
            )),
        }
    }
}

/// How many project test commands may run at the same time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parallelism {
    /// Every project in the impact set is started immediately.
    Unbounded,
    /// At most this many executors run concurrently; the rest wait for a slot.
    Limited(usize),
}

impl Default for Parallelism {
    fn default() -> Self {
        Parallelism::Unbounded
    }
}

impl From<Option<usize>> for Parallelism {
    fn from(limit: Option<usize>) -> Self {
        match limit {
            Some(n) => Parallelism::Limited(n),
            None => Parallelism::Unbounded,
        }
    }
}

/// Parse a compact duration string such as `500ms`, `30s`, `5m` or `1h`.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    // Find the boundary between digits and suffix.
    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| "duration missing unit suffix".to_string())?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    let seconds_per_unit = match unit.as_str() {
        "ms" => return Ok(Duration::from_millis(value)),
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        _ => {
            return Err(format!(
                "unsupported duration unit '{}'; expected ms, s, m, or h",
                unit
            ));
        }
    };

    value
        .checked_mul(seconds_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration '{}' is too large", s))
}

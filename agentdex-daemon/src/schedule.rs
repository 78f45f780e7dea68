//! Interval strings: `6h`, `30m`, `90s`, `1d`, or bare seconds.

use std::time::Duration;

use crate::error::DaemonError;

/// Six hours between runs.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(6 * 60 * 60);

/// Shortest accepted interval.
pub const MIN_INTERVAL: Duration = Duration::from_secs(60);

pub fn parse_interval(input: &str) -> Result<Duration, DaemonError> {
    let invalid = |reason: &str| DaemonError::Interval {
        input: input.to_string(),
        reason: reason.to_string(),
    };

    let trimmed = input.trim();
    let split = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let (digits, unit) = trimmed.split_at(split);
    if digits.is_empty() {
        return Err(invalid("expected a number followed by s, m, h or d"));
    }
    let value: u64 = digits.parse().map_err(|_| invalid("number too large"))?;
    let multiplier = match unit.trim() {
        "" | "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 24 * 60 * 60,
        _ => return Err(invalid("unknown unit; use s, m, h or d")),
    };
    let secs = value
        .checked_mul(multiplier)
        .ok_or_else(|| invalid("number too large"))?;

    let interval = Duration::from_secs(secs);
    if interval < MIN_INTERVAL {
        return Err(invalid("must be at least 1m"));
    }
    Ok(interval)
}

/// Compact form for log lines: `6h`, `90m`, `45s`.
pub fn format_interval(interval: Duration) -> String {
    let secs = interval.as_secs();
    match secs {
        s if s % 3600 == 0 => format!("{}h", s / 3600),
        s if s % 60 == 0 => format!("{}m", s / 60),
        s => format!("{s}s"),
    }
}

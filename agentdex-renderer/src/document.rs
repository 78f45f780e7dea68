//! Rendered catalog text and its freshness line.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Marker that starts the single freshness line of a rendered catalog.
pub const FRESHNESS_PREFIX: &str = "**Last updated:**";

/// `chrono` format of the freshness value.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M UTC";

/// Output of one render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedDocument {
    pub text: String,
    pub generated_at: DateTime<Utc>,
}

/// `**Last updated:** 2025-01-31 09:05 UTC`
pub fn freshness_line(at: DateTime<Utc>) -> String {
    format!("{FRESHNESS_PREFIX} {}", at.format(TIMESTAMP_FORMAT))
}

/// Whether `line` is the freshness line (leading whitespace allowed).
pub fn is_freshness_line(line: &str) -> bool {
    line.trim_start().starts_with(FRESHNESS_PREFIX)
}

/// Recover the timestamp from the first freshness line of `text`.
pub fn parse_freshness(text: &str) -> Option<DateTime<Utc>> {
    let line = text.lines().find(|l| is_freshness_line(l))?;
    let value = line.trim_start().strip_prefix(FRESHNESS_PREFIX)?.trim();
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn freshness_roundtrip_at_minute_precision() {
        let at = Utc.with_ymd_and_hms(2025, 1, 31, 9, 5, 42).unwrap();
        let line = freshness_line(at);
        assert_eq!(line, "**Last updated:** 2025-01-31 09:05 UTC");
        let parsed = parse_freshness(&format!("# Title\n\n{line}\n")).unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 1, 31, 9, 5, 0).unwrap());
    }

    #[test]
    fn garbage_timestamp_is_none() {
        assert!(parse_freshness("**Last updated:** yesterday\n").is_none());
        assert!(parse_freshness("no marker here").is_none());
    }
}

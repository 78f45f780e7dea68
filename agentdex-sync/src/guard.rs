//! Publish decision: does a fresh render differ from the persisted document
//! in anything but its freshness line?

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use agentdex_renderer::{is_freshness_line, parse_freshness, RenderedDocument};

/// CRLF → LF and the freshness line removed.
pub fn normalize(text: &str) -> String {
    let text = text.replace("\r\n", "\n");
    let mut out = String::with_capacity(text.len());
    for line in text.split_inclusive('\n') {
        if is_freshness_line(line) {
            continue;
        }
        out.push_str(line);
    }
    out
}

/// `true` when there is no previous document or the normalized texts differ.
pub fn should_publish(new_doc: &RenderedDocument, previous: Option<&str>) -> bool {
    match previous {
        None => true,
        Some(previous) => normalize(&new_doc.text) != normalize(previous),
    }
}

/// SHA-256 hex of the normalized text. Stable across runs that only move the
/// clock.
pub fn comparable_digest(text: &str) -> String {
    let mut h = Sha256::new();
    h.update(normalize(text).as_bytes());
    hex::encode(h.finalize())
}

/// Freshness timestamp of a persisted document, if it has a parseable one.
pub fn extract_timestamp(text: &str) -> Option<DateTime<Utc>> {
    parse_freshness(text)
}

//! Index files: header-less Markdown that lists links to sibling agent files.
//!
//! ```text
//! # Agents
//! - [Backend Architect](engineering/backend-architect.md) - Designs APIs
//! - [UI Designer](./design/ui-designer.md): Creates interfaces
//! ```
//!
//! Each linked entry becomes its own record pointing at the linked path,
//! resolved against the index file's directory.

use std::sync::OnceLock;

use regex::Regex;

/// Minimum number of linked entries for a file to count as an index.
pub const MIN_INDEX_ENTRIES: usize = 2;

/// One linked entry of an index file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    /// Link text as written.
    pub label: String,
    /// Repository-relative path of the linked file.
    pub path: String,
    /// Text following the link, separators removed. May be empty.
    pub trailing: String,
}

fn list_link_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"^\s*(?:[-*+]|\d+[.)])\s+\[([^\]]+)\]\(\s*<?([^)\s>]+)>?(?:\s+"[^"]*")?\s*\)(.*)$"#)
            .expect("static regex compiles")
    })
}

/// Scan `text` for list items linking to relative `.md` files.
///
/// `index_path` is the repository-relative path of the file being scanned.
/// Absolute URLs, anchors, links escaping the repository root and links back
/// to the index itself are ignored. Returns an empty vector when fewer than
/// [`MIN_INDEX_ENTRIES`] entries are found.
pub fn parse_index(text: &str, index_path: &str) -> Vec<IndexEntry> {
    let base = index_path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");
    let mut entries = Vec::new();

    for line in text.lines() {
        let Some(caps) = list_link_pattern().captures(line) else {
            continue;
        };
        let label = caps[1].trim();
        let target = caps[2].trim();
        if is_external(target) {
            continue;
        }
        let target = target
            .split(['#', '?'])
            .next()
            .unwrap_or_default()
            .replace("%20", " ");
        if !target.to_ascii_lowercase().ends_with(".md") {
            continue;
        }
        let Some(path) = resolve(base, &target) else {
            continue;
        };
        if path == index_path {
            continue;
        }
        entries.push(IndexEntry {
            label: clean_label(label),
            path,
            trailing: caps[3]
                .trim_start_matches(|c: char| c.is_whitespace() || matches!(c, '-' | ':' | '—' | '–'))
                .trim()
                .to_string(),
        });
    }

    if entries.len() < MIN_INDEX_ENTRIES {
        return Vec::new();
    }
    entries
}

fn is_external(target: &str) -> bool {
    target.starts_with('#')
        || target.starts_with('/')
        || target.contains("://")
        || target.starts_with("mailto:")
}

fn clean_label(label: &str) -> String {
    label.replace(['*', '`'], "").trim().to_string()
}

/// Join `target` onto `base` and normalize `.`/`..` segments. `None` if the
/// result would climb above the repository root.
fn resolve(base: &str, target: &str) -> Option<String> {
    let mut segments: Vec<&str> = base.split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            other => segments.push(other),
        }
    }
    if segments.is_empty() {
        return None;
    }
    Some(segments.join("/"))
}

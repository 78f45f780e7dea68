//! Small text helpers shared by the header and index parsers.

/// Character budget for catalog summaries, excluding the ellipsis marker.
pub const SUMMARY_CHAR_BUDGET: usize = 100;

/// Marker appended to truncated summaries.
pub const ELLIPSIS: &str = "...";

/// Turn an identifier-ish name into a display title.
///
/// Hyphens and underscores become spaces and every word gets an uppercase
/// first letter; the rest of each word is left alone so acronyms survive.
///
/// `code-refactorer` → `Code Refactorer`, `API_designer` → `API Designer`.
pub fn humanize(raw: &str) -> String {
    raw.replace(['-', '_'], " ")
        .split_whitespace()
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Collapse whitespace runs (including literal `\n` escapes that agent files
/// often embed in one-line descriptions) into single spaces.
pub fn collapse_whitespace(raw: &str) -> String {
    raw.replace("\\n", " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalize `raw` and cut it to [`SUMMARY_CHAR_BUDGET`] characters.
pub fn summarize(raw: &str) -> String {
    truncate(&collapse_whitespace(raw), SUMMARY_CHAR_BUDGET)
}

/// Truncate on a char boundary, trim trailing whitespace and append
/// [`ELLIPSIS`] when anything was cut.
pub fn truncate(text: &str, budget: usize) -> String {
    match text.char_indices().nth(budget) {
        None => text.to_string(),
        Some((cut, _)) => format!("{}{ELLIPSIS}", text[..cut].trim_end()),
    }
}

/// File name without its final extension.
pub fn file_stem(path: &str) -> &str {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rfind('.') {
        Some(0) | None => name,
        Some(dot) => &name[..dot],
    }
}

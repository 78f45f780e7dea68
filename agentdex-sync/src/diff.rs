//! Unified diff support for `agentdex diff`.

use similar::TextDiff;

/// Unified diff from `existing` to `rendered`, or `None` when the
/// LF-normalised texts are identical. `label` names the file in the headers.
pub fn unified_diff(existing: &str, rendered: &str, label: &str) -> Option<String> {
    let existing = normalize_line_endings(existing);
    let rendered = normalize_line_endings(rendered);
    if existing == rendered {
        return None;
    }
    let old_header = format!("a/{label}");
    let new_header = format!("b/{label}");
    Some(
        TextDiff::from_lines(&existing, &rendered)
            .unified_diff()
            .header(&old_header, &new_header)
            .context_radius(3)
            .to_string(),
    )
}

fn normalize_line_endings(content: &str) -> String {
    content.replace("\r\n", "\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_text_has_no_diff() {
        assert!(unified_diff("a\nb\n", "a\r\nb\r\n", "README.md").is_none());
    }

    #[test]
    fn edit_produces_unified_diff() {
        let diff = unified_diff("a\nb\nc\n", "a\nB\nc\n", "README.md").expect("diff");
        assert!(diff.contains("--- a/README.md"));
        assert!(diff.contains("+++ b/README.md"));
        assert!(diff.contains("@@"));
        assert!(diff.contains("-b\n"));
        assert!(diff.contains("+B\n"));
    }

    #[test]
    fn missing_document_diffs_against_empty() {
        let diff = unified_diff("", "# Title\n", "README.md").expect("diff");
        assert!(diff.contains("+# Title"));
    }
}

//! Record extraction for `agentdex-extractor`.
//!
//! `extract(file)` turns one fetched file into zero or more [`AgentRecord`]s.
//! Patterns are tried in order:
//!
//! 1. a leading `---` header block with `name` / `description` keys;
//! 2. a header-less index listing links to several agent files;
//! 3. anything else is skipped with a [`ParseWarning`].
//!
//! Extraction never fails. Agent files are semi-structured and drift over
//! time, so a malformed file costs its own records and nothing more.

pub mod header;
pub mod index;
pub mod text;

use std::fmt;

use agentdex_core::types::{blob_url, AgentRecord, RawFile};

pub use header::{parse_header, Header};
pub use index::{parse_index, IndexEntry};

use header::HeaderBlock;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Why a file contributed no records.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WarningKind {
    #[error("content is not valid UTF-8")]
    NotUtf8,

    #[error("header block has no closing '---' delimiter")]
    UnterminatedHeader,

    #[error("no header block and no index entries found")]
    NoAgentDefinition,
}

/// Non-fatal, per-file extraction diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseWarning {
    pub path: String,
    pub kind: WarningKind,
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.kind)
    }
}

/// Records and diagnostics produced from one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub records: Vec<AgentRecord>,
    pub warnings: Vec<ParseWarning>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Extract agent records from `file`.
pub fn extract(file: &RawFile) -> Extraction {
    let Ok(content) = std::str::from_utf8(&file.content) else {
        return skipped(file, WarningKind::NotUtf8);
    };
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    match header::locate(content) {
        HeaderBlock::Found(block) => {
            let header = header::parse_block(block);
            Extraction {
                records: vec![record_from_header(file, &header)],
                warnings: Vec::new(),
            }
        }
        HeaderBlock::Unterminated => skipped(file, WarningKind::UnterminatedHeader),
        HeaderBlock::Absent => {
            let entries = parse_index(content, &file.path);
            if entries.is_empty() {
                return skipped(file, WarningKind::NoAgentDefinition);
            }
            tracing::debug!(
                source = %file.source,
                path = %file.path,
                entries = entries.len(),
                "treating file as index",
            );
            Extraction {
                records: entries
                    .into_iter()
                    .map(|entry| record_from_index_entry(file, entry))
                    .collect(),
                warnings: Vec::new(),
            }
        }
    }
}

/// Extract every file in order and merge the results.
pub fn extract_all<'a>(files: impl IntoIterator<Item = &'a RawFile>) -> Extraction {
    let mut merged = Extraction::default();
    for file in files {
        let Extraction { records, warnings } = extract(file);
        merged.records.extend(records);
        merged.warnings.extend(warnings);
    }
    merged
}

// ---------------------------------------------------------------------------
// Record builders
// ---------------------------------------------------------------------------

fn record_from_header(file: &RawFile, header: &Header) -> AgentRecord {
    let title = match header.name() {
        Some(name) => text::humanize(name),
        None => text::humanize(text::file_stem(&file.path)),
    };
    let summary = header.description().map(text::summarize).unwrap_or_default();
    if summary.is_empty() {
        tracing::debug!(source = %file.source, path = %file.path, "header has no description");
    }
    AgentRecord {
        source: file.source.clone(),
        path: file.path.clone(),
        title,
        summary,
        link: file.link(),
    }
}

fn record_from_index_entry(file: &RawFile, entry: IndexEntry) -> AgentRecord {
    let title = if entry.label.is_empty() {
        text::humanize(text::file_stem(&entry.path))
    } else {
        text::humanize(&entry.label)
    };
    AgentRecord {
        source: file.source.clone(),
        link: blob_url(&file.source, &file.git_ref, &entry.path),
        path: entry.path,
        title,
        summary: text::summarize(&entry.trailing),
    }
}

fn skipped(file: &RawFile, kind: WarningKind) -> Extraction {
    tracing::warn!(
        source = %file.source,
        path = %file.path,
        reason = %kind,
        "skipping file",
    );
    Extraction {
        records: Vec::new(),
        warnings: vec![ParseWarning {
            path: file.path.clone(),
            kind,
        }],
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

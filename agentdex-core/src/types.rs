//! Domain types for the agent catalog.
//!
//! Sources come from static configuration and are read-only during a run.
//! Everything else here ([`RawFile`], [`AgentRecord`], [`Catalog`]) is built
//! fresh by each run and discarded afterwards.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use sha2::{Digest, Sha256};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed `owner/name` repository identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceId(pub String);

impl SourceId {
    /// Build an identifier from its two halves.
    pub fn from_parts(owner: &str, name: &str) -> Self {
        Self(format!("{owner}/{name}"))
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for SourceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SourceId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

fn default_branch() -> String {
    "main".to_string()
}

fn default_enabled() -> bool {
    true
}

fn default_paths() -> Vec<String> {
    vec!["agents".to_string()]
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(path) => vec![path],
        OneOrMany::Many(paths) => paths,
    })
}

/// A configured repository that publishes agent definitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub owner: String,
    pub name: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Directories (or single aggregator files) to scan, relative to the repo root.
    #[serde(
        default = "default_paths",
        alias = "agents_path",
        alias = "agentsPath",
        deserialize_with = "one_or_many"
    )]
    pub paths: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Source {
    /// Convenience constructor with defaults for everything but the repo.
    pub fn new(owner: &str, name: &str) -> Self {
        Self {
            owner: owner.to_string(),
            name: name.to_string(),
            branch: default_branch(),
            enabled: true,
            paths: default_paths(),
            description: None,
        }
    }

    pub fn id(&self) -> SourceId {
        SourceId::from_parts(&self.owner, &self.name)
    }

    /// `https://github.com/<owner>/<name>`
    pub fn repo_url(&self) -> String {
        format!("https://github.com/{}/{}", self.owner, self.name)
    }
}

/// Canonical browser link for a file inside a source repository.
///
/// Each segment of `git_ref` and `path` is percent-encoded so the link stays
/// a single Markdown link target (spaces, pipes, parentheses).
pub fn blob_url(source: &SourceId, git_ref: &str, path: &str) -> String {
    format!(
        "https://github.com/{source}/blob/{}/{}",
        encode_segments(git_ref),
        encode_segments(path)
    )
}

fn encode_segments(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

// ---------------------------------------------------------------------------
// RawFile
// ---------------------------------------------------------------------------

/// A fetched candidate file. Produced by the fetcher, consumed by the
/// extractor, then dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFile {
    pub source: SourceId,
    /// Repository-relative path, `/`-separated.
    pub path: String,
    /// Branch the file was resolved from.
    pub git_ref: String,
    pub content: Vec<u8>,
    /// SHA-256 hex digest of `content`.
    pub content_hash: String,
}

impl RawFile {
    pub fn new(
        source: SourceId,
        path: impl Into<String>,
        git_ref: impl Into<String>,
        content: Vec<u8>,
    ) -> Self {
        let content_hash = {
            let mut h = Sha256::new();
            h.update(&content);
            hex::encode(h.finalize())
        };
        Self {
            source,
            path: path.into(),
            git_ref: git_ref.into(),
            content,
            content_hash,
        }
    }

    /// Last path segment.
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// Canonical link to this file.
    pub fn link(&self) -> String {
        blob_url(&self.source, &self.git_ref, &self.path)
    }
}

// ---------------------------------------------------------------------------
// AgentRecord
// ---------------------------------------------------------------------------

/// One cataloged agent. Identity is `(source, path)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentRecord {
    pub source: SourceId,
    pub path: String,
    pub title: String,
    pub summary: String,
    pub link: String,
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Per-source state as shown in the repository listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SourceStatus {
    /// Fetched this run; `records` agents contributed.
    Ok { records: usize },
    /// Fetch failed this run; kept in the listing with zero records.
    Degraded { reason: String },
    /// Disabled in configuration.
    Disabled,
}

/// Repository-level row of the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSummary {
    pub id: SourceId,
    pub repo_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub enabled: bool,
    pub status: SourceStatus,
}

/// Merged, deduplicated, deterministically ordered result of one run.
///
/// `records` is grouped by source in registration order; `sources` lists every
/// configured source in the same order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Catalog {
    pub sources: Vec<SourceSummary>,
    pub records: Vec<AgentRecord>,
}

impl Catalog {
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Records contributed by one source, in catalog order.
    pub fn records_for<'a>(&'a self, id: &'a SourceId) -> impl Iterator<Item = &'a AgentRecord> {
        self.records.iter().filter(move |r| &r.source == id)
    }

    /// Sources whose fetch failed this run.
    pub fn degraded(&self) -> impl Iterator<Item = &SourceSummary> {
        self.sources
            .iter()
            .filter(|s| matches!(s.status, SourceStatus::Degraded { .. }))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

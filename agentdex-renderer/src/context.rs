//! Template context — serializable rendering payload built from a [`Catalog`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use agentdex_core::types::{Catalog, SourceStatus, SourceSummary};

use crate::document::freshness_line;
use crate::error::RenderError;

/// Everything the catalog template can reference. Cell values are already
/// escaped for Markdown tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogContext {
    pub title: String,
    /// Full freshness line, e.g. `**Last updated:** 2025-01-31 09:05 UTC`.
    pub freshness: String,
    pub generated_at: DateTime<Utc>,
    pub total_agents: usize,
    pub total_sources: usize,
    pub sources: Vec<SourceRow>,
    pub agents: Vec<AgentRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRow {
    pub name: String,
    pub url: String,
    pub description: String,
    pub enabled: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRow {
    pub title: String,
    pub link: String,
    pub summary: String,
    pub source: String,
    pub source_url: String,
}

/// Make `text` safe inside a table cell: newlines fold to spaces and pipes
/// are escaped.
pub fn escape_cell(text: &str) -> String {
    text.replace("\r\n", " ")
        .replace(['\n', '\r'], " ")
        .replace('|', "\\|")
        .trim()
        .to_string()
}

/// Like [`escape_cell`], plus brackets so the text can be a link label.
pub fn escape_link_text(text: &str) -> String {
    escape_cell(text).replace('[', "\\[").replace(']', "\\]")
}

fn status_text(status: &SourceStatus) -> String {
    match status {
        SourceStatus::Ok { records: 1 } => "OK (1 agent)".to_string(),
        SourceStatus::Ok { records } => format!("OK ({records} agents)"),
        SourceStatus::Degraded { reason } => format!("Degraded: {}", escape_cell(reason)),
        SourceStatus::Disabled => "Disabled".to_string(),
    }
}

fn source_row(summary: &SourceSummary) -> SourceRow {
    SourceRow {
        name: escape_link_text(&summary.id.to_string()),
        url: summary.repo_url.clone(),
        description: summary
            .description
            .as_deref()
            .map(escape_cell)
            .unwrap_or_default(),
        enabled: if summary.enabled { "Yes" } else { "No" }.to_string(),
        status: status_text(&summary.status),
    }
}

impl CatalogContext {
    pub fn from_catalog(catalog: &Catalog, title: &str, generated_at: DateTime<Utc>) -> Self {
        let agents = catalog
            .records
            .iter()
            .map(|record| AgentRow {
                title: escape_link_text(&record.title),
                link: record.link.clone(),
                summary: escape_cell(&record.summary),
                source: escape_link_text(&record.source.to_string()),
                source_url: format!("https://github.com/{}", record.source),
            })
            .collect();

        CatalogContext {
            title: title.to_string(),
            freshness: freshness_line(generated_at),
            generated_at,
            total_agents: catalog.record_count(),
            total_sources: catalog.sources.len(),
            sources: catalog.sources.iter().map(source_row).collect(),
            agents,
        }
    }

    /// Convert to a [`tera::Context`] for rendering.
    pub fn to_tera_context(&self) -> Result<tera::Context, RenderError> {
        tera::Context::from_serialize(self).map_err(RenderError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipes_and_newlines_are_escaped() {
        assert_eq!(escape_cell("a | b\nc\r\nd"), "a \\| b c d");
        assert_eq!(escape_link_text("[x]|y"), "\\[x\\]\\|y");
    }

    #[test]
    fn tera_context_exposes_rows() {
        let at = DateTime::<Utc>::from_timestamp(0, 0).unwrap();
        let ctx = CatalogContext::from_catalog(&Catalog::default(), "T", at)
            .to_tera_context()
            .expect("context serializes");
        assert_eq!(ctx.get("title").and_then(|v| v.as_str()), Some("T"));
        assert_eq!(ctx.get("total_agents").and_then(|v| v.as_u64()), Some(0));
        assert!(ctx.get("agents").is_some_and(|v| v.is_array()));
    }

    #[test]
    fn status_text_variants() {
        assert_eq!(status_text(&SourceStatus::Ok { records: 1 }), "OK (1 agent)");
        assert_eq!(status_text(&SourceStatus::Ok { records: 0 }), "OK (0 agents)");
        assert_eq!(
            status_text(&SourceStatus::Degraded { reason: "HTTP 502 | retry".into() }),
            "Degraded: HTTP 502 \\| retry"
        );
        assert_eq!(status_text(&SourceStatus::Disabled), "Disabled");
    }
}

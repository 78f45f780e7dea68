//! One catalog run, end to end.
//!
//! ```text
//! registry ─▶ fetch (parallel, per source) ─▶ extract ─▶ build ─▶ render
//!                                                                  │
//!                              lock ─▶ load previous ─▶ guard ─▶ save / no-op
//! ```
//!
//! Fetch failures stay inside their source and show up as `Degraded` rows
//! and `Failed` reports. Only authentication failures, configuration errors
//! and local I/O abort a run.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use agentdex_core::types::{Catalog, RawFile, Source, SourceId};
use agentdex_core::{CatalogConfig, SourceRegistry};
use agentdex_extractor::extract_all;
use agentdex_fetch::{ContentFetcher, CredentialProvider, FetchError};
use agentdex_renderer::{RenderedDocument, Renderer};

use crate::builder::{self, SourceOutcome};
use crate::diff::unified_diff;
use crate::error::SyncError;
use crate::guard;
use crate::store::{DocumentStore, FileDocumentStore};

// ---------------------------------------------------------------------------
// Fetch seam
// ---------------------------------------------------------------------------

/// Anything that can produce the candidate files of one source.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    async fn fetch(&self, source: &Source) -> Result<Vec<RawFile>, FetchError>;
}

#[async_trait]
impl SourceFetcher for ContentFetcher {
    async fn fetch(&self, source: &Source) -> Result<Vec<RawFile>, FetchError> {
        ContentFetcher::fetch(self, source).await
    }
}

// ---------------------------------------------------------------------------
// Run result
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Decide but never write.
    pub dry_run: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuppressReason {
    /// Every enabled source failed. The run is a failure.
    AllSourcesFailed,
    /// Nothing to fetch. Not a failure.
    NoSourcesEnabled,
}

/// What the caller (commit collaborator) should do with the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PublishDecision {
    /// New content was written and should be committed.
    Publish,
    Unchanged,
    DryRun { would_publish: bool },
    Suppressed { reason: SuppressReason },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SourceReport {
    Fetched {
        source: SourceId,
        files: usize,
        records: usize,
        warnings: usize,
    },
    Failed {
        source: SourceId,
        error: String,
    },
}

impl SourceReport {
    pub fn source(&self) -> &SourceId {
        match self {
            SourceReport::Fetched { source, .. } | SourceReport::Failed { source, .. } => source,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, SourceReport::Failed { .. })
    }
}

/// A per-file parse warning, attributed to its source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarningReport {
    pub source: SourceId,
    pub path: String,
    pub message: String,
}

/// Machine-readable summary of one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub decision: PublishDecision,
    pub record_count: usize,
    pub sources: Vec<SourceReport>,
    pub warnings: Vec<WarningReport>,
    /// Digest of the rendered document with the freshness line removed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    #[serde(skip)]
    pub document: Option<RenderedDocument>,
}

impl RunResult {
    /// Total fetch failure: the caller must exit non-zero.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self.decision,
            PublishDecision::Suppressed {
                reason: SuppressReason::AllSourcesFailed
            }
        )
    }

    pub fn failed_sources(&self) -> impl Iterator<Item = &SourceReport> {
        self.sources.iter().filter(|r| r.is_failed())
    }

    pub fn to_json(&self) -> Result<String, SyncError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Fetched, extracted and merged state of one run, before rendering.
#[derive(Debug, Clone)]
pub struct Collected {
    pub catalog: Catalog,
    pub reports: Vec<SourceReport>,
    pub warnings: Vec<WarningReport>,
}

impl Collected {
    pub fn failed(&self) -> usize {
        self.reports.iter().filter(|r| r.is_failed()).count()
    }
}

// ---------------------------------------------------------------------------
// SyncOrchestrator
// ---------------------------------------------------------------------------

pub struct SyncOrchestrator {
    registry: SourceRegistry,
    fetcher: Arc<dyn SourceFetcher>,
    renderer: Renderer,
    store: Arc<dyn DocumentStore>,
    source_concurrency: usize,
}

impl SyncOrchestrator {
    pub fn new(
        registry: SourceRegistry,
        fetcher: Arc<dyn SourceFetcher>,
        renderer: Renderer,
        store: Arc<dyn DocumentStore>,
        source_concurrency: usize,
    ) -> Self {
        Self {
            registry,
            fetcher,
            renderer,
            store,
            source_concurrency: source_concurrency.max(1),
        }
    }

    /// Production wiring: GitHub fetcher, embedded (or overridden) template,
    /// file store at `output` or the configured output file.
    pub fn from_config(
        config: &CatalogConfig,
        credentials: &dyn CredentialProvider,
        output: Option<&Path>,
    ) -> Result<Self, SyncError> {
        let registry = config.registry()?;
        let fetcher = ContentFetcher::from_config(&config.fetch, credentials).map_err(|e| {
            if e.is_fatal() {
                SyncError::Auth(e.to_string())
            } else {
                SyncError::Fetch(e)
            }
        })?;
        let renderer = Renderer::with_template_dir(
            config.generation.title.clone(),
            config.generation.template_dir.as_deref(),
        )?;
        let output = output.unwrap_or(config.generation.output_file.as_path());
        Ok(Self::new(
            registry,
            Arc::new(fetcher),
            renderer,
            Arc::new(FileDocumentStore::new(output)),
            config.fetch.source_concurrency,
        ))
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    /// Fetch every enabled source, extract and build the catalog.
    ///
    /// Sources are fetched concurrently but results are consumed in registry
    /// order. An authentication failure from any source aborts.
    pub async fn collect(&self) -> Result<Collected, SyncError> {
        let enabled = self.registry.list_enabled_sources();
        let fetched: Vec<(&Source, Result<Vec<RawFile>, FetchError>)> = stream::iter(enabled)
            .map(|source| async move { (source, self.fetcher.fetch(source).await) })
            .buffered(self.source_concurrency)
            .collect()
            .await;

        let mut outcomes = HashMap::new();
        let mut reports = Vec::with_capacity(fetched.len());
        let mut warnings = Vec::new();

        for (source, result) in fetched {
            let id = source.id();
            match result {
                Err(err) if err.is_fatal() => {
                    error!(source = %id, error = %err, "authentication failed");
                    return Err(SyncError::Auth(format!("{id}: {err}")));
                }
                Err(err) => {
                    warn!(source = %id, error = %err, "source degraded");
                    reports.push(SourceReport::Failed {
                        source: id.clone(),
                        error: err.to_string(),
                    });
                    outcomes.insert(id, SourceOutcome::Failed(err.to_string()));
                }
                Ok(files) => {
                    let extraction = extract_all(&files);
                    warnings.extend(extraction.warnings.iter().map(|w| WarningReport {
                        source: id.clone(),
                        path: w.path.clone(),
                        message: w.kind.to_string(),
                    }));
                    reports.push(SourceReport::Fetched {
                        source: id.clone(),
                        files: files.len(),
                        records: extraction.records.len(),
                        warnings: extraction.warnings.len(),
                    });
                    outcomes.insert(id, SourceOutcome::Fetched(extraction.records));
                }
            }
        }

        Ok(Collected {
            catalog: builder::build(&self.registry, &outcomes),
            reports,
            warnings,
        })
    }

    /// Run the whole pipeline once and decide whether to publish.
    pub async fn run_once(&self, options: RunOptions) -> Result<RunResult, SyncError> {
        let started_at = Utc::now();
        let enabled = self.registry.list_enabled_sources().len();

        if enabled == 0 {
            warn!("no sources enabled; nothing to publish");
            return Ok(RunResult {
                started_at,
                finished_at: Utc::now(),
                decision: PublishDecision::Suppressed {
                    reason: SuppressReason::NoSourcesEnabled,
                },
                record_count: 0,
                sources: Vec::new(),
                warnings: Vec::new(),
                digest: None,
                document: None,
            });
        }

        let collected = self.collect().await?;
        let document = self.renderer.render(&collected.catalog, None)?;
        let digest = guard::comparable_digest(&document.text);

        let decision = if collected.failed() == enabled {
            error!(sources = enabled, "every enabled source failed; refusing to publish");
            PublishDecision::Suppressed {
                reason: SuppressReason::AllSourcesFailed,
            }
        } else {
            let _lock = self.store.lock()?;
            let previous = self.store.load()?;
            let publish = guard::should_publish(&document, previous.as_deref());
            if options.dry_run {
                PublishDecision::DryRun {
                    would_publish: publish,
                }
            } else if publish {
                self.store.save(&document.text)?;
                PublishDecision::Publish
            } else {
                PublishDecision::Unchanged
            }
        };

        let result = RunResult {
            started_at,
            finished_at: Utc::now(),
            decision,
            record_count: collected.catalog.record_count(),
            sources: collected.reports,
            warnings: collected.warnings,
            digest: Some(digest),
            document: Some(document),
        };
        info!(
            decision = ?result.decision,
            records = result.record_count,
            failed = result.failed_sources().count(),
            warnings = result.warnings.len(),
            "run finished",
        );
        Ok(result)
    }

    /// Render with the persisted document's own timestamp and diff against
    /// it. `None` means a sync would not change anything.
    pub async fn diff(&self, label: &str) -> Result<Option<String>, SyncError> {
        let collected = self.collect().await?;
        let previous = self.store.load()?;
        let at = previous.as_deref().and_then(guard::extract_timestamp);
        let document = self.renderer.render(&collected.catalog, at)?;
        Ok(unified_diff(
            previous.as_deref().unwrap_or_default(),
            &document.text,
            label,
        ))
    }
}

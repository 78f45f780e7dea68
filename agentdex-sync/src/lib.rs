//! # agentdex-sync
//!
//! Catalog building, change detection and the run orchestrator.
//!
//! Call [`SyncOrchestrator::run_once`] to fetch every enabled source, render
//! the catalog and publish it only when something other than the freshness
//! timestamp changed.

pub mod builder;
pub mod diff;
pub mod error;
pub mod guard;
pub mod lock;
pub mod orchestrator;
pub mod store;

pub use builder::{build, natural_cmp, SourceOutcome};
pub use diff::unified_diff;
pub use error::SyncError;
pub use guard::{comparable_digest, extract_timestamp, should_publish};
pub use lock::RunLock;
pub use orchestrator::{
    Collected, PublishDecision, RunOptions, RunResult, SourceFetcher, SourceReport,
    SuppressReason, SyncOrchestrator, WarningReport,
};
pub use store::{DocumentStore, FileDocumentStore, MemoryDocumentStore, DEFAULT_STALE_LOCK};

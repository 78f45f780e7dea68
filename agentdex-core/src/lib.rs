//! agentdex core library — domain types, source registry, configuration, errors.
//!
//! - [`types`] — newtypes and catalog domain structs
//! - [`error`] — [`ConfigError`]
//! - [`registry`] — [`SourceRegistry`] validation and ordered listing
//! - [`config`] — `agentdex.yaml` loading

pub mod config;
pub mod error;
pub mod registry;
pub mod types;

pub use config::{CatalogConfig, FetchConfig, GenerationConfig, LoggingConfig};
pub use error::ConfigError;
pub use registry::SourceRegistry;
pub use types::{
    blob_url, AgentRecord, Catalog, RawFile, Source, SourceId, SourceStatus, SourceSummary,
};

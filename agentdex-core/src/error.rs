//! Error types for agentdex-core.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::SourceId;

/// Configuration problems. All of them are fatal and abort a run before any
/// fetch is attempted.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure while reading the configuration file.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file did not exist at the expected path.
    #[error("configuration not found at {path}")]
    NotFound { path: PathBuf },

    /// YAML parse error on load — includes file path and line context from serde_yaml.
    #[error("failed to parse configuration at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The same `owner/name` was configured more than once.
    #[error("duplicate source '{id}' (entries #{first} and #{second})")]
    DuplicateSource {
        id: SourceId,
        first: usize,
        second: usize,
    },

    /// A source entry is structurally unusable.
    #[error("invalid source entry #{index}: {reason}")]
    InvalidSource { index: usize, reason: String },

    /// A tuning value outside its accepted range.
    #[error("invalid setting '{key}': {reason}")]
    InvalidSetting { key: &'static str, reason: String },
}

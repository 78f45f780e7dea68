//! Error types for agentdex-sync.

use std::path::PathBuf;

use thiserror::Error;

use agentdex_core::ConfigError;
use agentdex_fetch::FetchError;
use agentdex_renderer::RenderError;

/// Errors that abort a run. Per-source fetch failures and per-file parse
/// warnings never surface here; they are reported in the run result.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Missing or rejected credentials. Nothing is published.
    #[error("authentication error: {0}")]
    Auth(String),

    /// An error from the rendering engine.
    #[error("render error: {0}")]
    Render(#[from] RenderError),

    /// Another run holds the lock on the output document.
    #[error("another run holds the lock at {}", path.display())]
    Locked { path: PathBuf },

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The HTTP client could not be set up.
    #[error("fetch setup error: {0}")]
    Fetch(FetchError),

    /// Run summary serialization error.
    #[error("run summary JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}

use std::path::PathBuf;

use thiserror::Error;

/// Errors that stop the scheduled loop.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A run failed in a way the next tick cannot recover from.
    #[error("sync error: {0}")]
    Sync(#[from] agentdex_sync::SyncError),

    #[error("invalid interval {input:?}: {reason}")]
    Interval { input: String, reason: String },

    #[error("signal handler failed: {0}")]
    Signal(String),
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> DaemonError {
    DaemonError::Io {
        path: path.into(),
        source,
    }
}

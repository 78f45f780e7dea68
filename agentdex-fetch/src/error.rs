use std::time::Duration;

use thiserror::Error;

/// Failure while talking to the hosting API for one source.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Missing, invalid or revoked credentials. Aborts the whole run.
    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("rate limited on {url}")]
    RateLimited {
        url: String,
        retry_after: Option<Duration>,
    },

    #[error("{what} timed out after {}s", after.as_secs())]
    Timeout { what: String, after: Duration },

    #[error("GET {url} returned HTTP {status}")]
    Http { url: String, status: u16 },

    #[error("GET {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("unexpected response from {url}: {message}")]
    Decode { url: String, message: String },
}

impl FetchError {
    /// Transient failures worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::RateLimited { .. }
            | FetchError::Timeout { .. }
            | FetchError::Transport { .. } => true,
            FetchError::Http { status, .. } => *status >= 500,
            FetchError::Auth(_) | FetchError::Decode { .. } => false,
        }
    }

    /// Errors that must abort the run rather than degrade one source.
    pub fn is_fatal(&self) -> bool {
        matches!(self, FetchError::Auth(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::Http { status: 404, .. })
    }
}

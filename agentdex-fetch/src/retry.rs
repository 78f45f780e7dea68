//! Exponential backoff for transient fetch failures.
//!
//! [`RetryPolicy`] is plain data plus a delay function; [`RetryPolicy::retry`]
//! drives any async operation whose error type implements [`Retryable`]. Sleeps
//! go through `tokio::time`, so tests run it under paused time.

use std::future::Future;
use std::time::Duration;

use agentdex_core::FetchConfig;
use tracing::{debug, warn};

use crate::error::FetchError;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Error classification consumed by [`RetryPolicy::retry`].
pub trait Retryable {
    fn is_retryable(&self) -> bool;

    /// Server-provided wait, used instead of the computed backoff.
    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

impl Retryable for FetchError {
    fn is_retryable(&self) -> bool {
        FetchError::is_retryable(self)
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            FetchError::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl From<&FetchConfig> for RetryPolicy {
    fn from(config: &FetchConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
        }
    }
}

// ---------------------------------------------------------------------------
// Backoff
// ---------------------------------------------------------------------------

impl RetryPolicy {
    /// Delay after the failed attempt `attempt` (0-indexed):
    /// `min(base * 2^attempt, max)`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Run `operation` until it succeeds, fails with a non-retryable error or
    /// `max_attempts` is reached. The last error is returned on exhaustion.
    pub async fn retry<F, Fut, T, E>(&self, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Retryable + std::fmt::Display,
    {
        let max = self.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!(attempt = attempt + 1, "retry succeeded");
                    }
                    return Ok(value);
                }
                Err(err) => {
                    if !err.is_retryable() {
                        debug!(attempt = attempt + 1, error = %err, "not retryable");
                        return Err(err);
                    }
                    if attempt + 1 >= max {
                        warn!(attempts = max, error = %err, "retry attempts exhausted");
                        return Err(err);
                    }
                    let delay = match err.retry_after() {
                        Some(hint) => hint.min(self.max_delay),
                        None => self.delay_for(attempt),
                    };
                    debug!(
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "retrying",
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

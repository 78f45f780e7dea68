use std::future::Future;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use agentdex_sync::{PublishDecision, RunOptions, SyncError, SyncOrchestrator};

use crate::error::{io_err, DaemonError};
use crate::schedule::format_interval;

/// Counters for one daemon lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub runs: usize,
    pub published: usize,
    pub unchanged: usize,
    pub failed: usize,
    pub skipped_locked: usize,
}

/// Build a runtime and block the current thread until ctrl-c.
pub fn start_blocking(
    orchestrator: SyncOrchestrator,
    interval: Duration,
) -> Result<LoopStats, DaemonError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;
    runtime.block_on(run(&orchestrator, interval))
}

/// Run every `interval` until ctrl-c. The first run starts immediately.
pub async fn run(orchestrator: &SyncOrchestrator, interval: Duration) -> Result<LoopStats, DaemonError> {
    let shutdown = async {
        tokio::signal::ctrl_c()
            .await
            .map_err(|err| DaemonError::Signal(err.to_string()))?;
        info!("received ctrl-c, shutting down daemon");
        Ok(())
    };
    run_until(orchestrator, interval, shutdown).await
}

/// Run every `interval` until `shutdown` resolves.
///
/// A run in progress is never interrupted. A run that finds the output locked
/// or fails on I/O is logged and the loop waits for the next tick.
/// Authentication and configuration errors end the loop: another tick would
/// fail the same way.
pub async fn run_until<F>(
    orchestrator: &SyncOrchestrator,
    interval: Duration,
    shutdown: F,
) -> Result<LoopStats, DaemonError>
where
    F: Future<Output = Result<(), DaemonError>>,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tokio::pin!(shutdown);

    let mut stats = LoopStats::default();
    info!(interval = %format_interval(interval), "daemon started");

    loop {
        tokio::select! {
            biased;
            signal = &mut shutdown => {
                signal?;
                info!(runs = stats.runs, published = stats.published, "daemon stopped");
                return Ok(stats);
            }
            _ = ticker.tick() => {}
        }

        stats.runs += 1;
        match orchestrator.run_once(RunOptions::default()).await {
            Ok(result) if result.is_fatal() => {
                stats.failed += 1;
                error!(run = stats.runs, "every source failed; nothing published");
            }
            Ok(result) => match result.decision {
                PublishDecision::Publish => stats.published += 1,
                _ => stats.unchanged += 1,
            },
            Err(SyncError::Locked { path }) => {
                stats.skipped_locked += 1;
                warn!(path = %path.display(), "another run holds the lock; skipping");
            }
            Err(err @ (SyncError::Auth(_) | SyncError::Config(_))) => {
                error!(error = %err, "stopping daemon");
                return Err(err.into());
            }
            Err(err) => {
                stats.failed += 1;
                error!(error = %err, "run failed; retrying next tick");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use agentdex_core::types::{RawFile, Source};
    use agentdex_core::SourceRegistry;
    use agentdex_fetch::FetchError;
    use agentdex_renderer::Renderer;
    use agentdex_sync::{
        DocumentStore, FileDocumentStore, MemoryDocumentStore, RunLock, SourceFetcher,
        DEFAULT_STALE_LOCK,
    };
    use async_trait::async_trait;
    use tempfile::TempDir;
    use tokio_test::{assert_err, assert_ok};

    const HOUR: Duration = Duration::from_secs(3600);

    struct OneAgent {
        auth_fails: bool,
    }

    #[async_trait]
    impl SourceFetcher for OneAgent {
        async fn fetch(&self, source: &Source) -> Result<Vec<RawFile>, FetchError> {
            if self.auth_fails {
                return Err(FetchError::Auth("token revoked".to_string()));
            }
            Ok(vec![RawFile::new(
                source.id(),
                "agents/planner.md",
                "main",
                b"---\nname: planner\ndescription: Plans work\n---\n".to_vec(),
            )])
        }
    }

    fn orchestrator(auth_fails: bool, store: Arc<dyn DocumentStore>) -> SyncOrchestrator {
        let registry = SourceRegistry::new(vec![Source::new("acme", "agents")]).unwrap();
        SyncOrchestrator::new(
            registry,
            Arc::new(OneAgent { auth_fails }),
            Renderer::new("Catalog").unwrap(),
            store,
            1,
        )
    }

    async fn stop_after(after: Duration) -> Result<(), DaemonError> {
        tokio::time::sleep(after).await;
        Ok(())
    }

    #[tokio::test(start_paused = true, flavor = "current_thread")]
    async fn runs_once_per_tick_until_shutdown() {
        let store = Arc::new(MemoryDocumentStore::default());
        let orch = orchestrator(false, store.clone());

        let stats = assert_ok!(run_until(&orch, HOUR, stop_after(HOUR * 5 / 2)).await);

        assert_eq!(stats.runs, 3, "ticks at 0h, 1h and 2h");
        assert_eq!(stats.published, 1);
        assert_eq!(stats.unchanged, 2);
        assert_eq!(store.save_count(), 1);
    }

    #[tokio::test(start_paused = true, flavor = "current_thread")]
    async fn locked_runs_are_skipped_not_fatal() {
        let tmp = TempDir::new().unwrap();
        let store = FileDocumentStore::new(tmp.path().join("README.md"));
        let _held = RunLock::acquire(store.lock_path(), DEFAULT_STALE_LOCK).unwrap();
        let orch = orchestrator(false, Arc::new(store.clone()));

        let stats = assert_ok!(run_until(&orch, HOUR, stop_after(HOUR + HOUR / 2)).await);

        assert_eq!(stats.runs, 2);
        assert_eq!(stats.skipped_locked, 2);
        assert!(!store.path().exists());
    }

    #[tokio::test(start_paused = true, flavor = "current_thread")]
    async fn auth_failure_stops_the_loop() {
        let orch = orchestrator(true, Arc::new(MemoryDocumentStore::default()));

        let err = assert_err!(run_until(&orch, HOUR, stop_after(HOUR * 10)).await);

        assert!(matches!(err, DaemonError::Sync(SyncError::Auth(_))), "got: {err}");
    }

    #[tokio::test(start_paused = true, flavor = "current_thread")]
    async fn failing_signal_handler_is_reported() {
        let orch = orchestrator(false, Arc::new(MemoryDocumentStore::default()));
        let shutdown = async { Err(DaemonError::Signal("no handler".to_string())) };

        let err = assert_err!(run_until(&orch, HOUR, shutdown).await);

        assert!(matches!(err, DaemonError::Signal(_)));
    }
}

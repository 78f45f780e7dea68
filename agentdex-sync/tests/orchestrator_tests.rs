//! SyncOrchestrator end to end over a scripted fetcher.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use agentdex_core::types::{RawFile, Source, SourceId};
use agentdex_core::SourceRegistry;
use agentdex_fetch::FetchError;
use agentdex_renderer::Renderer;
use agentdex_sync::{
    DocumentStore, FileDocumentStore, MemoryDocumentStore, PublishDecision, RunLock, RunOptions,
    SourceFetcher, SuppressReason, SyncError, SyncOrchestrator, DEFAULT_STALE_LOCK,
};
use async_trait::async_trait;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Fake fetcher
// ---------------------------------------------------------------------------

#[derive(Clone)]
enum Reply {
    Files(Vec<(&'static str, String)>),
    Http(u16),
    Auth,
}

#[derive(Default)]
struct FakeFetcher {
    replies: HashMap<SourceId, Reply>,
    delays: HashMap<SourceId, Duration>,
    calls: AtomicUsize,
}

impl FakeFetcher {
    fn reply(mut self, id: &str, reply: Reply) -> Self {
        self.replies.insert(SourceId::from(id), reply);
        self
    }

    fn delay(mut self, id: &str, delay: Duration) -> Self {
        self.delays.insert(SourceId::from(id), delay);
        self
    }
}

#[async_trait]
impl SourceFetcher for FakeFetcher {
    async fn fetch(&self, source: &Source) -> Result<Vec<RawFile>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let id = source.id();
        if let Some(delay) = self.delays.get(&id) {
            tokio::time::sleep(*delay).await;
        }
        match self.replies.get(&id).cloned() {
            Some(Reply::Files(files)) => Ok(files
                .into_iter()
                .map(|(path, content)| {
                    RawFile::new(id.clone(), path, "main", content.into_bytes())
                })
                .collect()),
            Some(Reply::Http(status)) => Err(FetchError::Http {
                url: format!("https://api.test/repos/{id}/contents"),
                status,
            }),
            Some(Reply::Auth) => Err(FetchError::Auth("bad credentials".to_string())),
            None => Ok(Vec::new()),
        }
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

const HEADER_FILE: &str =
    "---\nname: code-refactorer\ndescription: Improves code structure\n---\n\nYou refactor.\n";
const INDEX_FILE: &str =
    "# Agents\n\n- [Zeta Agent](zeta.md) - Last one\n- [Alpha Agent](alpha.md) - First one\n";

fn source(id: &str, enabled: bool) -> Source {
    let (owner, name) = id.split_once('/').unwrap();
    let mut source = Source::new(owner, name);
    source.enabled = enabled;
    source
}

fn registry(sources: &[(&str, bool)]) -> SourceRegistry {
    SourceRegistry::new(sources.iter().map(|(id, on)| source(id, *on)).collect()).unwrap()
}

fn two_sources() -> FakeFetcher {
    FakeFetcher::default()
        .reply(
            "acme/a",
            Reply::Files(vec![("agents/code-refactorer.md", HEADER_FILE.to_string())]),
        )
        .reply(
            "acme/b",
            Reply::Files(vec![("agents/README.md", INDEX_FILE.to_string())]),
        )
}

fn orchestrator(
    registry: SourceRegistry,
    fetcher: Arc<FakeFetcher>,
    store: Arc<dyn DocumentStore>,
) -> SyncOrchestrator {
    SyncOrchestrator::new(
        registry,
        fetcher,
        Renderer::new("Catalog").unwrap(),
        store,
        4,
    )
}

fn position(text: &str, needle: &str) -> usize {
    text.find(needle)
        .unwrap_or_else(|| panic!("{needle:?} missing from:\n{text}"))
}

// ---------------------------------------------------------------------------
// Happy path
// ---------------------------------------------------------------------------

#[tokio::test]
async fn header_and_index_sources_render_in_order() {
    let store = Arc::new(MemoryDocumentStore::default());
    let orch = orchestrator(
        registry(&[("acme/a", true), ("acme/b", true)]),
        Arc::new(two_sources()),
        store.clone(),
    );

    let result = orch.run_once(RunOptions::default()).await.unwrap();

    assert_eq!(result.decision, PublishDecision::Publish);
    assert_eq!(result.record_count, 3);
    assert!(!result.is_fatal());

    let text = store.text().expect("document saved");
    let refactorer = position(&text, "[Code Refactorer]");
    let alpha = position(&text, "[Alpha Agent]");
    let zeta = position(&text, "[Zeta Agent]");
    assert!(refactorer < alpha && alpha < zeta);
    assert!(text.contains("https://github.com/acme/b/blob/main/agents/alpha.md"));
    assert!(text.contains("Improves code structure"));
}

#[tokio::test]
async fn second_identical_run_is_unchanged() {
    let store = Arc::new(MemoryDocumentStore::default());
    let orch = orchestrator(
        registry(&[("acme/a", true), ("acme/b", true)]),
        Arc::new(two_sources()),
        store.clone(),
    );

    let first = orch.run_once(RunOptions::default()).await.unwrap();
    let second = orch.run_once(RunOptions::default()).await.unwrap();

    assert_eq!(first.decision, PublishDecision::Publish);
    assert_eq!(second.decision, PublishDecision::Unchanged);
    assert_eq!(first.digest, second.digest);
    assert_eq!(store.save_count(), 1);
}

#[tokio::test]
async fn timestamp_only_difference_is_not_published() {
    let fresh = Arc::new(MemoryDocumentStore::default());
    orchestrator(
        registry(&[("acme/a", true)]),
        Arc::new(two_sources()),
        fresh.clone(),
    )
    .run_once(RunOptions::default())
    .await
    .unwrap();
    let published = fresh.text().unwrap();
    let line_start = position(&published, "**Last updated:**");
    let line_end = line_start + published[line_start..].find('\n').unwrap();
    let backdated = format!(
        "{}**Last updated:** 2001-01-01 00:00 UTC{}",
        &published[..line_start],
        &published[line_end..]
    );

    let store = Arc::new(MemoryDocumentStore::with_text(backdated.clone()));
    let orch = orchestrator(
        registry(&[("acme/a", true)]),
        Arc::new(two_sources()),
        store.clone(),
    );
    let result = orch.run_once(RunOptions::default()).await.unwrap();

    assert_eq!(result.decision, PublishDecision::Unchanged);
    assert_eq!(store.text().as_deref(), Some(backdated.as_str()));
}

#[tokio::test(start_paused = true)]
async fn output_does_not_depend_on_completion_order() {
    let slow_a = two_sources().delay("acme/a", Duration::from_secs(5));
    let slow_b = two_sources().delay("acme/b", Duration::from_secs(5));
    let registry_pair = || registry(&[("acme/a", true), ("acme/b", true)]);

    let first = orchestrator(
        registry_pair(),
        Arc::new(slow_a),
        Arc::new(MemoryDocumentStore::default()),
    )
    .run_once(RunOptions::default())
    .await
    .unwrap();
    let second = orchestrator(
        registry_pair(),
        Arc::new(slow_b),
        Arc::new(MemoryDocumentStore::default()),
    )
    .run_once(RunOptions::default())
    .await
    .unwrap();

    assert_eq!(first.digest, second.digest);
    assert_eq!(first.sources, second.sources);
}

#[tokio::test]
async fn duplicate_paths_keep_last_definition() {
    let fetcher = FakeFetcher::default().reply(
        "acme/a",
        Reply::Files(vec![
            ("agents/x.md", "---\nname: old-name\n---\n".to_string()),
            ("agents/x.md", "---\nname: new-name\n---\n".to_string()),
        ]),
    );
    let store = Arc::new(MemoryDocumentStore::default());
    let orch = orchestrator(registry(&[("acme/a", true)]), Arc::new(fetcher), store.clone());

    let result = orch.run_once(RunOptions::default()).await.unwrap();

    assert_eq!(result.record_count, 1);
    let text = store.text().unwrap();
    assert!(text.contains("[New Name]"));
    assert!(!text.contains("[Old Name]"));
}

#[tokio::test]
async fn unparseable_files_are_reported_as_warnings() {
    let fetcher = FakeFetcher::default().reply(
        "acme/a",
        Reply::Files(vec![
            ("agents/code-refactorer.md", HEADER_FILE.to_string()),
            ("agents/notes.md", "Just some notes.\n".to_string()),
        ]),
    );
    let orch = orchestrator(
        registry(&[("acme/a", true)]),
        Arc::new(fetcher),
        Arc::new(MemoryDocumentStore::default()),
    );

    let result = orch.run_once(RunOptions::default()).await.unwrap();

    assert_eq!(result.record_count, 1);
    assert_eq!(result.warnings.len(), 1);
    assert_eq!(result.warnings[0].path, "agents/notes.md");
    assert_eq!(result.warnings[0].source, SourceId::from("acme/a"));
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn partial_failure_publishes_with_degraded_row() {
    let fetcher = two_sources().reply("acme/b", Reply::Http(502));
    let store = Arc::new(MemoryDocumentStore::default());
    let orch = orchestrator(
        registry(&[("acme/a", true), ("acme/b", true)]),
        Arc::new(fetcher),
        store.clone(),
    );

    let result = orch.run_once(RunOptions::default()).await.unwrap();

    assert_eq!(result.decision, PublishDecision::Publish);
    assert!(!result.is_fatal());
    assert_eq!(result.failed_sources().count(), 1);
    assert_eq!(result.record_count, 1);
    let text = store.text().unwrap();
    assert!(text.contains("Degraded"));
    assert!(text.contains("acme/b"));
}

#[tokio::test]
async fn total_failure_is_suppressed_and_fatal() {
    let fetcher = FakeFetcher::default()
        .reply("acme/a", Reply::Http(500))
        .reply("acme/b", Reply::Http(404));
    let store = Arc::new(MemoryDocumentStore::with_text("previous"));
    let orch = orchestrator(
        registry(&[("acme/a", true), ("acme/b", true)]),
        Arc::new(fetcher),
        store.clone(),
    );

    let result = orch.run_once(RunOptions::default()).await.unwrap();

    assert_eq!(
        result.decision,
        PublishDecision::Suppressed {
            reason: SuppressReason::AllSourcesFailed
        }
    );
    assert!(result.is_fatal());
    assert_eq!(store.save_count(), 0);
    assert_eq!(store.text().as_deref(), Some("previous"));
}

#[tokio::test]
async fn no_enabled_sources_is_suppressed_but_not_fatal() {
    let fetcher = Arc::new(two_sources());
    let store = Arc::new(MemoryDocumentStore::default());
    let orch = orchestrator(registry(&[("acme/a", false)]), fetcher.clone(), store.clone());

    let result = orch.run_once(RunOptions::default()).await.unwrap();

    assert_eq!(
        result.decision,
        PublishDecision::Suppressed {
            reason: SuppressReason::NoSourcesEnabled
        }
    );
    assert!(!result.is_fatal());
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    assert_eq!(store.save_count(), 0);
}

#[tokio::test]
async fn auth_failure_aborts_the_run() {
    let fetcher = two_sources().reply("acme/b", Reply::Auth);
    let store = Arc::new(MemoryDocumentStore::default());
    let orch = orchestrator(
        registry(&[("acme/a", true), ("acme/b", true)]),
        Arc::new(fetcher),
        store.clone(),
    );

    let err = orch.run_once(RunOptions::default()).await.unwrap_err();

    assert!(matches!(err, SyncError::Auth(_)), "got: {err}");
    assert_eq!(store.save_count(), 0);
}

#[tokio::test]
async fn disabled_source_is_listed_but_not_fetched() {
    let fetcher = Arc::new(two_sources());
    let store = Arc::new(MemoryDocumentStore::default());
    let orch = orchestrator(
        registry(&[("acme/a", true), ("acme/b", false)]),
        fetcher.clone(),
        store.clone(),
    );

    let result = orch.run_once(RunOptions::default()).await.unwrap();

    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    assert_eq!(result.sources.len(), 1);
    let text = store.text().unwrap();
    assert!(text.contains("Disabled"));
    assert!(!text.contains("[Alpha Agent]"));
}

// ---------------------------------------------------------------------------
// Dry run, locking, diff
// ---------------------------------------------------------------------------

#[tokio::test]
async fn dry_run_never_writes() {
    let store = Arc::new(MemoryDocumentStore::default());
    let orch = orchestrator(
        registry(&[("acme/a", true)]),
        Arc::new(two_sources()),
        store.clone(),
    );

    let result = orch.run_once(RunOptions { dry_run: true }).await.unwrap();

    assert_eq!(
        result.decision,
        PublishDecision::DryRun {
            would_publish: true
        }
    );
    assert!(result.document.is_some());
    assert_eq!(store.save_count(), 0);
}

#[tokio::test]
async fn held_lock_blocks_a_file_backed_run() {
    let tmp = TempDir::new().unwrap();
    let store = FileDocumentStore::new(tmp.path().join("README.md"));
    let _held = RunLock::acquire(store.lock_path(), DEFAULT_STALE_LOCK).unwrap();

    let orch = orchestrator(
        registry(&[("acme/a", true)]),
        Arc::new(two_sources()),
        Arc::new(store.clone()),
    );
    let err = orch.run_once(RunOptions::default()).await.unwrap_err();

    assert!(matches!(err, SyncError::Locked { .. }), "got: {err}");
    assert!(!store.path().exists());
}

#[tokio::test]
async fn file_backed_run_writes_and_releases_lock() {
    let tmp = TempDir::new().unwrap();
    let store = FileDocumentStore::new(tmp.path().join("README.md"));
    let orch = orchestrator(
        registry(&[("acme/a", true)]),
        Arc::new(two_sources()),
        Arc::new(store.clone()),
    );

    let result = orch.run_once(RunOptions::default()).await.unwrap();

    assert_eq!(result.decision, PublishDecision::Publish);
    assert!(store.path().exists());
    assert!(!store.lock_path().exists());
    assert!(!store.tmp_path().exists());
}

#[tokio::test]
async fn diff_is_empty_until_content_changes() {
    let store = Arc::new(MemoryDocumentStore::default());
    orchestrator(
        registry(&[("acme/a", true), ("acme/b", true)]),
        Arc::new(two_sources()),
        store.clone(),
    )
    .run_once(RunOptions::default())
    .await
    .unwrap();

    let same = orchestrator(
        registry(&[("acme/a", true), ("acme/b", true)]),
        Arc::new(two_sources()),
        store.clone(),
    );
    assert_eq!(same.diff("README.md").await.unwrap(), None);

    let changed = orchestrator(
        registry(&[("acme/a", true), ("acme/b", true)]),
        Arc::new(two_sources().reply("acme/b", Reply::Files(Vec::new()))),
        store.clone(),
    );
    let diff = changed.diff("README.md").await.unwrap().expect("diff");
    assert!(diff.contains("--- a/README.md"));
    assert!(diff.contains("-| [Alpha Agent]"));
    assert_eq!(store.save_count(), 1);
}

#[tokio::test]
async fn run_result_serializes_decision_kind() {
    let orch = orchestrator(
        registry(&[("acme/a", true)]),
        Arc::new(two_sources()),
        Arc::new(MemoryDocumentStore::default()),
    );
    let result = orch.run_once(RunOptions::default()).await.unwrap();

    let json: serde_json::Value = serde_json::from_str(&result.to_json().unwrap()).unwrap();
    assert_eq!(json["decision"]["kind"], "publish");
    assert_eq!(json["record_count"], 1);
    assert_eq!(json["sources"][0]["outcome"], "fetched");
    assert_eq!(json["sources"][0]["source"], "acme/a");
}

//! Persisted catalog document.
//!
//! ## `FileDocumentStore::save` — atomic protocol
//!
//! 1. Normalise line endings to LF.
//! 2. Create the parent directory if needed.
//! 3. Write to `<path>.agentdex.tmp`.
//! 4. Rename over the final path (atomic on POSIX).
//! 5. On rename failure remove the tmp file; the original stays intact.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use crate::error::{io_err, SyncError};
use crate::lock::RunLock;

/// Default age after which a leftover lock file is reclaimed.
pub const DEFAULT_STALE_LOCK: Duration = Duration::from_secs(60 * 60);

/// Where the last published document lives.
pub trait DocumentStore: Send + Sync {
    /// Previous document, `None` if nothing was published yet.
    fn load(&self) -> Result<Option<String>, SyncError>;

    fn save(&self, text: &str) -> Result<(), SyncError>;

    /// Exclusive guard over the load/decide/save sequence. Stores without a
    /// shared backing file need none.
    fn lock(&self) -> Result<Option<RunLock>, SyncError> {
        Ok(None)
    }
}

// ---------------------------------------------------------------------------
// File-backed store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct FileDocumentStore {
    path: PathBuf,
    stale_lock_after: Duration,
}

impl FileDocumentStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            stale_lock_after: DEFAULT_STALE_LOCK,
        }
    }

    pub fn with_stale_lock_after(mut self, after: Duration) -> Self {
        self.stale_lock_after = after;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `<path>.agentdex.tmp`
    pub fn tmp_path(&self) -> PathBuf {
        PathBuf::from(format!("{}.agentdex.tmp", self.path.display()))
    }

    /// `<path>.agentdex.lock`
    pub fn lock_path(&self) -> PathBuf {
        PathBuf::from(format!("{}.agentdex.lock", self.path.display()))
    }
}

impl DocumentStore for FileDocumentStore {
    fn load(&self) -> Result<Option<String>, SyncError> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(io_err(&self.path, err)),
        }
    }

    fn save(&self, text: &str) -> Result<(), SyncError> {
        atomic_write(&self.path, text, &self.tmp_path())
    }

    fn lock(&self) -> Result<Option<RunLock>, SyncError> {
        RunLock::acquire(self.lock_path(), self.stale_lock_after).map(Some)
    }
}

fn atomic_write(path: &Path, content: &str, tmp: &Path) -> Result<(), SyncError> {
    let normalized = content.replace("\r\n", "\n");

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    if let Some(tmp_parent) = tmp.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(tmp_parent).map_err(|e| io_err(tmp_parent, e))?;
    }
    std::fs::write(tmp, normalized).map_err(|e| io_err(tmp, e))?;

    if let Err(e) = std::fs::rename(tmp, path) {
        let _ = std::fs::remove_file(tmp);
        return Err(io_err(path, e));
    }

    tracing::info!(path = %path.display(), "wrote catalog");
    Ok(())
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Keeps the document in memory. Used by embedders and tests.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    text: Mutex<Option<String>>,
    saves: Mutex<usize>,
}

impl MemoryDocumentStore {
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: Mutex::new(Some(text.into())),
            saves: Mutex::new(0),
        }
    }

    pub fn text(&self) -> Option<String> {
        self.text.lock().map(|t| t.clone()).unwrap_or_default()
    }

    /// Number of successful `save` calls.
    pub fn save_count(&self) -> usize {
        self.saves.lock().map(|n| *n).unwrap_or_default()
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn load(&self) -> Result<Option<String>, SyncError> {
        Ok(self.text())
    }

    fn save(&self, text: &str) -> Result<(), SyncError> {
        if let Ok(mut slot) = self.text.lock() {
            *slot = Some(text.replace("\r\n", "\n"));
        }
        if let Ok(mut saves) = self.saves.lock() {
            *saves += 1;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

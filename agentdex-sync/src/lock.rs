//! Cross-process run lock beside the output document.
//!
//! The lock is a file created with `create_new`, so only one holder can exist
//! at a time. A lock file older than the stale threshold is assumed to belong
//! to a crashed run and is reclaimed.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::Utc;

use crate::error::{io_err, SyncError};

/// Held for the duration of one load/decide/save sequence. Released on drop.
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
}

impl RunLock {
    pub fn acquire(path: impl Into<PathBuf>, stale_after: Duration) -> Result<Self, SyncError> {
        let path = path.into();
        match Self::create(&path) {
            Ok(lock) => Ok(lock),
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                if !is_stale(&path, stale_after) {
                    return Err(SyncError::Locked { path });
                }
                tracing::warn!(path = %path.display(), "reclaiming stale run lock");
                match std::fs::remove_file(&path) {
                    Ok(()) => {}
                    Err(e) if e.kind() == ErrorKind::NotFound => {}
                    Err(e) => return Err(io_err(&path, e)),
                }
                match Self::create(&path) {
                    Ok(lock) => Ok(lock),
                    Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                        Err(SyncError::Locked { path })
                    }
                    Err(e) => Err(io_err(&path, e)),
                }
            }
            Err(err) => Err(io_err(&path, err)),
        }
    }

    fn create(path: &Path) -> std::io::Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
        writeln!(file, "pid={} acquired={}", std::process::id(), Utc::now().to_rfc3339())?;
        tracing::debug!(path = %path.display(), "run lock acquired");
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if let Err(err) = std::fs::remove_file(&self.path) {
            tracing::warn!(path = %self.path.display(), error = %err, "failed to release run lock");
        }
    }
}

fn is_stale(path: &Path, stale_after: Duration) -> bool {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|modified| SystemTime::now().duration_since(modified).ok())
        .map(|age| age > stale_after)
        .unwrap_or(false)
}

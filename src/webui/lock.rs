//! Exclusive lock serializing installs against one root.
//!
//! The swap step is not safe against a concurrent second install of the same
//! root, so every entry point takes this lock first. It is an OS-level file
//! lock (via `fs4`) on `<parent>/.<root>.lock`, released when the guard is
//! dropped.
//!
//! All blocking file calls go through `spawn_blocking`.

use crate::constants::{MAX_BACKOFF_DELAY_MS, STARTING_BACKOFF_DELAY_MS, default_lock_timeout};
use crate::core::{Result, WebUiError};
use fs4::fs_std::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_retry::strategy::ExponentialBackoff;
use tracing::debug;

/// Held for the duration of an inspect/install cycle.
#[derive(Debug)]
pub struct InstallLock {
    /// The file handle - lock is released when this is dropped
    _file: Arc<File>,
    lock_path: PathBuf,
}

impl Drop for InstallLock {
    fn drop(&mut self) {
        debug!(path = %self.lock_path.display(), "Install lock released");
    }
}

impl InstallLock {
    pub async fn acquire(lock_path: &Path) -> Result<Self> {
        Self::acquire_with_timeout(lock_path, default_lock_timeout()).await
    }

    /// Acquire the lock, polling with exponential backoff (10ms → 500ms).
    ///
    /// # Errors
    ///
    /// [`WebUiError::LockTimeout`] if another holder keeps it past `timeout`.
    pub async fn acquire_with_timeout(lock_path: &Path, timeout: Duration) -> Result<Self> {
        debug!(path = %lock_path.display(), "Waiting for install lock");

        if let Some(parent) = lock_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| WebUiError::fs("create lock directory", parent, e))?;
        }

        let path = lock_path.to_path_buf();
        let file = tokio::task::spawn_blocking(move || {
            OpenOptions::new().create(true).write(true).truncate(false).open(&path)
        })
        .await
        .map_err(|e| WebUiError::Io(std::io::Error::other(e)))?
        .map_err(|e| WebUiError::fs("open lock file", lock_path, e))?;
        let file = Arc::new(file);

        let start = Instant::now();
        let backoff = ExponentialBackoff::from_millis(STARTING_BACKOFF_DELAY_MS)
            .max_delay(Duration::from_millis(MAX_BACKOFF_DELAY_MS));

        for delay in backoff {
            let candidate = Arc::clone(&file);
            let locked = tokio::task::spawn_blocking(move || candidate.try_lock_exclusive())
                .await
                .map_err(|e| WebUiError::Io(std::io::Error::other(e)))?;

            if let Ok(true) = locked {
                debug!(
                    path = %lock_path.display(),
                    wait_ms = start.elapsed().as_millis(),
                    "Install lock acquired"
                );
                return Ok(Self {
                    _file: file,
                    lock_path: lock_path.to_path_buf(),
                });
            }

            let remaining = timeout.saturating_sub(start.elapsed());
            if remaining.is_zero() {
                break;
            }
            tokio::time::sleep(delay.min(remaining)).await;
        }

        Err(WebUiError::LockTimeout {
            path: lock_path.display().to_string(),
            waited_secs: timeout.as_secs(),
        })
    }
}

//! Downloading release archives and their declared digests.
//!
//! URL layout of the release store:
//!
//! ```text
//! <releases_url>/download/<version>/<prefix>-<version>.zip   archive of a concrete tag
//! <releases_url>/download/<version>/md5sum                   declared digest of that tag
//! <releases_url>/latest/download/...                         same, for the preview sentinel
//! ```
//!
//! Progress is published as immutable [`DownloadProgress`] snapshots on a
//! `tokio::sync::watch` channel. Sending on a watch channel never waits for
//! the receiver, so an observer can never slow the transfer down.

use crate::config::ReleaseEndpoints;
use crate::constants::{DIGEST_RESOURCE, PREVIEW_SENTINEL};
use crate::core::{Result, WebUiError};
use crate::webui::transport::Transport;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Snapshot of a running download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DownloadProgress {
    pub bytes_transferred: u64,
    /// Content length announced by the server, if any.
    pub total_bytes: Option<u64>,
}

impl DownloadProgress {
    /// Whole percent transferred, capped at 100. `None` when the total is unknown.
    pub fn percent(&self) -> Option<u8> {
        match self.total_bytes {
            Some(0) => Some(100),
            Some(total) => {
                let pct = self.bytes_transferred.saturating_mul(100) / total;
                Some(pct.min(100) as u8)
            }
            None => None,
        }
    }
}

/// One download attempt. Lives only until the archive is extracted or the
/// attempt fails; it is never persisted and never resumed.
#[derive(Debug, Clone)]
pub struct DownloadJob {
    pub url: String,
    pub destination: PathBuf,
    pub expected_len: Option<u64>,
    pub bytes_transferred: u64,
}

impl DownloadJob {
    fn snapshot(&self) -> DownloadProgress {
        DownloadProgress {
            bytes_transferred: self.bytes_transferred,
            total_bytes: self.expected_len,
        }
    }
}

/// Fetches archives and declared digests from the release store.
pub struct ReleaseFetcher<'a, T: Transport> {
    transport: &'a T,
    endpoints: &'a ReleaseEndpoints,
    download_dir: PathBuf,
    progress: Option<watch::Sender<DownloadProgress>>,
}

impl<'a, T: Transport> ReleaseFetcher<'a, T> {
    pub fn new(transport: &'a T, endpoints: &'a ReleaseEndpoints, download_dir: PathBuf) -> Self {
        Self {
            transport,
            endpoints,
            download_dir,
            progress: None,
        }
    }

    /// Publish progress snapshots on `sender`.
    #[must_use]
    pub fn with_progress(mut self, sender: watch::Sender<DownloadProgress>) -> Self {
        self.progress = Some(sender);
        self
    }

    /// `<prefix>-<version>.zip`
    pub fn archive_name(&self, version: &str) -> String {
        format!("{}-{}.zip", self.endpoints.bundle_prefix, version)
    }

    /// Directory URL holding the assets of `version`.
    ///
    /// The preview sentinel maps to the "latest" alias, every concrete tag to
    /// its versioned path.
    pub fn version_base_url(&self, version: &str) -> String {
        let base = self.endpoints.releases_url.trim_end_matches('/');
        if version == PREVIEW_SENTINEL {
            format!("{base}/latest/download")
        } else {
            format!("{base}/download/{version}")
        }
    }

    pub fn archive_url(&self, version: &str) -> String {
        format!("{}/{}", self.version_base_url(version), self.archive_name(version))
    }

    pub fn digest_url(&self, version: &str) -> String {
        format!("{}/{}", self.version_base_url(version), DIGEST_RESOURCE)
    }

    /// Digest the release store declares for `version`.
    ///
    /// Any failure (unreachable, error status, empty body) yields `None`,
    /// meaning "verification unavailable" rather than "verification failed".
    pub async fn fetch_declared_digest(&self, version: &str) -> Option<String> {
        let url = self.digest_url(version);
        match self.transport.get_text(&url).await {
            Ok(body) => {
                let digest = body.split_whitespace().next().unwrap_or_default().to_string();
                if digest.is_empty() {
                    warn!(%url, "Declared digest is empty");
                    None
                } else {
                    Some(digest)
                }
            }
            Err(e) => {
                warn!(%url, "Declared digest unavailable: {}", e);
                None
            }
        }
    }

    /// Download the archive of `version` into the download directory.
    ///
    /// A leftover file at the destination is removed first; a failed
    /// attempt removes its partial file.
    ///
    /// # Errors
    ///
    /// [`WebUiError::Network`] when the store is unreachable or the transfer
    /// breaks off, [`WebUiError::FileSystem`] when the file cannot be written.
    pub async fn download(&self, version: &str) -> Result<PathBuf> {
        let mut job = DownloadJob {
            url: self.archive_url(version),
            destination: self.download_dir.join(self.archive_name(version)),
            expected_len: None,
            bytes_transferred: 0,
        };

        info!("Downloading web UI (version \"{}\") from {}", version, job.url);

        match self.transfer(&mut job).await {
            Ok(()) => {
                info!(bytes = job.bytes_transferred, "Downloading web UI done");
                Ok(job.destination)
            }
            Err(e) => {
                remove_if_exists(&job.destination).await;
                Err(e)
            }
        }
    }

    async fn transfer(&self, job: &mut DownloadJob) -> Result<()> {
        fs::create_dir_all(&self.download_dir)
            .await
            .map_err(|e| WebUiError::fs("create download directory", &self.download_dir, e))?;

        match fs::remove_file(&job.destination).await {
            Ok(()) => debug!("Removed stale archive {}", job.destination.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(WebUiError::fs("remove stale archive", &job.destination, e)),
        }

        let mut body = self.transport.get_stream(&job.url).await?;
        job.expected_len = body.content_length;
        self.publish(job);

        let mut file = fs::File::create(&job.destination)
            .await
            .map_err(|e| WebUiError::fs("create archive file", &job.destination, e))?;

        while let Some(chunk) = body.chunks.next().await {
            let chunk = chunk?;
            file.write_all(&chunk)
                .await
                .map_err(|e| WebUiError::fs("write archive file", &job.destination, e))?;
            job.bytes_transferred += chunk.len() as u64;
            self.publish(job);
        }

        file.flush().await.map_err(|e| WebUiError::fs("flush archive file", &job.destination, e))?;
        drop(file);

        match job.expected_len {
            Some(expected) if expected != job.bytes_transferred => Err(WebUiError::network(
                format!("download {}", job.url),
                format!("received {} of {} bytes", job.bytes_transferred, expected),
            )),
            _ => Ok(()),
        }
    }

    fn publish(&self, job: &DownloadJob) {
        if let Some(sender) = &self.progress {
            sender.send_replace(job.snapshot());
        }
    }
}

async fn remove_if_exists(path: &Path) {
    match fs::remove_file(path).await {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
            warn!("Failed to remove partial download {}: {}", path.display(), e);
        }
        _ => {}
    }
}

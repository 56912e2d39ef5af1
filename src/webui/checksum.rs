//! Content digest of a web UI installation.
//!
//! The release build publishes one reference digest per version (the
//! `md5sum` resource next to the archive). To compare against it, the local
//! digest must be computed exactly the same way:
//!
//! 1. Walk the installation root recursively, keeping regular files only
//! 2. Sort them by root-relative path (`/`-separated, byte-wise)
//! 3. MD5 each file's full content and hex-encode it (lower case)
//! 4. Concatenate the per-file hex strings in sorted order
//! 5. MD5 the concatenation and hex-encode it
//!
//! An empty tree therefore digests to the MD5 of the empty string. MD5 is used
//! for corruption and staleness detection only; it is not a tamper-proof
//! signature.

use crate::core::{Result, WebUiError};
use md5::{Digest, Md5};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Computes and compares installation digests.
pub struct BundleDigest;

impl BundleDigest {
    /// Digest every regular file under `root`.
    ///
    /// Runs on the blocking pool so a large bundle does not stall the runtime.
    ///
    /// # Errors
    ///
    /// Any read failure aborts the whole computation with
    /// [`WebUiError::FileSystem`]; no partial digest is returned.
    pub async fn compute(root: &Path) -> Result<String> {
        let root = root.to_path_buf();
        tokio::task::spawn_blocking(move || Self::compute_blocking(&root))
            .await
            .map_err(|e| WebUiError::Io(std::io::Error::other(e)))?
    }

    /// Synchronous form of [`compute`](Self::compute).
    pub fn compute_blocking(root: &Path) -> Result<String> {
        debug!("Computing bundle digest for {}", root.display());

        let files = collect_files(root)?;
        let mut combined = String::with_capacity(files.len() * 32);

        for (_, path) in &files {
            combined.push_str(&Self::file_digest(path)?);
        }

        let digest = hex::encode(Md5::digest(combined.as_bytes()));
        debug!(files = files.len(), %digest, "Bundle digest computed");
        Ok(digest)
    }

    /// MD5 of one file's content, lower-case hex.
    pub fn file_digest(path: &Path) -> Result<String> {
        let mut file =
            File::open(path).map_err(|e| WebUiError::fs("open file for digest", path, e))?;
        let mut hasher = Md5::new();
        std::io::copy(&mut file, &mut hasher)
            .map_err(|e| WebUiError::fs("read file for digest", path, e))?;
        Ok(hex::encode(hasher.finalize()))
    }

    /// Compare the digest of `root` with an expected value.
    ///
    /// Returns the computed digest on success.
    ///
    /// # Errors
    ///
    /// [`WebUiError::IntegrityMismatch`] when the digests differ (compared
    /// case-insensitively), or a file system error from the computation.
    pub async fn verify(root: &Path, version: &str, expected: &str) -> Result<String> {
        info!("Verifying web UI files in {}", root.display());

        let actual = Self::compute(root).await?;
        Self::compare(version, expected, &actual)?;
        Ok(actual)
    }

    /// Compare an already computed digest with an expected value.
    ///
    /// # Errors
    ///
    /// [`WebUiError::IntegrityMismatch`] when they differ.
    pub fn compare(version: &str, expected: &str, actual: &str) -> Result<()> {
        if actual.eq_ignore_ascii_case(expected.trim()) {
            return Ok(());
        }

        Err(WebUiError::IntegrityMismatch {
            version: version.to_string(),
            expected: expected.trim().to_string(),
            actual: actual.to_string(),
        })
    }
}

/// Regular files under `root`, sorted by normalized relative path.
fn collect_files(root: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            WebUiError::fs("walk installation", &path, e.into())
        })?;

        if entry.file_type().is_file() {
            let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
            let key = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            files.push((key, entry.into_path()));
        }
    }

    files.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));
    Ok(files)
}

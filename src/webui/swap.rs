//! Staged replacement of the installation root.
//!
//! A new bundle is extracted into a sibling staging directory and then
//! swapped into place with two renames:
//!
//! ```text
//! <parent>/<root>            current installation
//! <parent>/.<root>.staging   bundle being installed
//! <parent>/.<root>.previous  installation replaced by the last swap
//! ```
//!
//! 1. `root` → `previous` (an older `previous` is removed first)
//! 2. `staging` → `root`
//!
//! If step 2 fails, `previous` is renamed back. A crash between the two
//! renames leaves `root` absent with the old bundle intact in `previous`;
//! [`InstallPaths::recover_interrupted_swap`] moves it back before the next
//! inspection, so the old bundle is verified instead of discarded.

use crate::constants::REVISION_FILE;
use crate::core::{Result, WebUiError};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

/// Paths derived from an installation root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallPaths {
    root: PathBuf,
    staging: PathBuf,
    previous: PathBuf,
    lock: PathBuf,
}

impl InstallPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let sibling = |suffix: &str| {
            let mut name = OsString::from(".");
            name.push(root.file_name().unwrap_or_else(|| "webui".as_ref()));
            name.push(suffix);
            root.with_file_name(name)
        };

        Self {
            staging: sibling(".staging"),
            previous: sibling(".previous"),
            lock: sibling(".lock"),
            root,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn staging(&self) -> &Path {
        &self.staging
    }

    pub fn previous(&self) -> &Path {
        &self.previous
    }

    /// Lock file serializing installs against this root.
    pub fn lock_file(&self) -> &Path {
        &self.lock
    }

    pub fn revision_file(&self) -> PathBuf {
        self.root.join(REVISION_FILE)
    }

    /// Start from an empty staging directory.
    pub async fn prepare_staging(&self) -> Result<()> {
        remove_dir_if_exists(&self.staging).await?;
        fs::create_dir_all(&self.staging)
            .await
            .map_err(|e| WebUiError::fs("create staging directory", &self.staging, e))?;
        Ok(())
    }

    /// Remove a staging directory left by a failed install.
    pub async fn discard_staging(&self) {
        if let Err(e) = remove_dir_if_exists(&self.staging).await {
            warn!("Failed to clean up staging directory: {}", e);
        }
    }

    /// Swap the staging directory into place.
    ///
    /// With `keep_previous` the replaced installation is retained for
    /// [`rollback`](Self::rollback); otherwise it is deleted after the swap.
    pub async fn promote_staging(&self, keep_previous: bool) -> Result<()> {
        remove_dir_if_exists(&self.previous).await?;

        let had_root = path_exists(&self.root).await;
        if had_root {
            debug!("Moving {} aside to {}", self.root.display(), self.previous.display());
            rename(&self.root, &self.previous, "move current installation aside").await?;
        }

        if let Err(e) = rename(&self.staging, &self.root, "move staged installation into place").await
        {
            if had_root {
                warn!("Swap failed, restoring previous installation");
                if let Err(restore) = rename(&self.previous, &self.root, "restore installation").await
                {
                    warn!("Failed to restore previous installation: {}", restore);
                }
            }
            return Err(e);
        }

        if had_root && !keep_previous {
            if let Err(e) = remove_dir_if_exists(&self.previous).await {
                warn!("Failed to remove replaced installation: {}", e);
            }
        }

        info!("Installed web UI into {}", self.root.display());
        Ok(())
    }

    /// Put `previous` back in place when `root` is missing.
    ///
    /// Returns the restored version, or `None` when there was nothing to do.
    pub async fn recover_interrupted_swap(&self) -> Result<Option<String>> {
        if path_exists(&self.root).await || !self.has_previous().await {
            return Ok(None);
        }

        let version = read_revision(&self.previous).await?;
        warn!(
            "Web UI root {} is missing, restoring {}",
            self.root.display(),
            self.previous.display()
        );
        rename(&self.previous, &self.root, "restore interrupted swap").await?;
        Ok(version)
    }

    pub async fn has_previous(&self) -> bool {
        path_exists(&self.previous.join(REVISION_FILE)).await
    }

    /// Version recorded in the retained previous installation.
    pub async fn previous_version(&self) -> Option<String> {
        read_revision(&self.previous).await.ok().flatten()
    }

    /// Swap the retained previous installation back into place.
    ///
    /// The installation being replaced becomes the new previous one, so a
    /// second rollback undoes the first. Returns the restored version.
    pub async fn rollback(&self) -> Result<String> {
        if !self.has_previous().await {
            return Err(WebUiError::NoPreviousInstall {
                path: self.previous.display().to_string(),
            });
        }

        let version = read_revision(&self.previous).await?.unwrap_or_default();
        warn!("Rolling web UI back to version {}", version);

        // Reuse the staging slot as the temporary name for the current root.
        remove_dir_if_exists(&self.staging).await?;
        let had_root = path_exists(&self.root).await;
        if had_root {
            rename(&self.root, &self.staging, "move current installation aside").await?;
        }

        if let Err(e) = rename(&self.previous, &self.root, "restore previous installation").await {
            if had_root {
                if let Err(restore) = rename(&self.staging, &self.root, "restore installation").await
                {
                    warn!("Failed to restore current installation: {}", restore);
                }
            }
            return Err(e);
        }

        if had_root {
            rename(&self.staging, &self.previous, "retain replaced installation").await?;
        }

        info!("Rolled back to web UI {}", version);
        Ok(version)
    }
}

/// Trimmed content of `<dir>/revision`, or `None` if the marker is absent
/// or blank.
pub async fn read_revision(dir: &Path) -> Result<Option<String>> {
    let path = dir.join(REVISION_FILE);
    match fs::read_to_string(&path).await {
        Ok(content) => {
            let version = content.trim();
            if version.is_empty() {
                warn!("Ignoring empty revision marker {}", path.display());
                return Ok(None);
            }
            Ok(Some(version.to_string()))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(WebUiError::fs("read revision marker", &path, e)),
    }
}

pub(crate) async fn remove_dir_if_exists(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path).await {
        Ok(()) => {
            debug!("Removed {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(WebUiError::fs("remove directory", path, e)),
    }
}

async fn path_exists(path: &Path) -> bool {
    fs::try_exists(path).await.unwrap_or(false)
}

async fn rename(from: &Path, to: &Path, operation: &str) -> Result<()> {
    fs::rename(from, to).await.map_err(|e| WebUiError::fs(operation, from, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn install_dir(dir: &Path, version: &str) {
        fs::create_dir_all(dir).await.unwrap();
        fs::write(dir.join(REVISION_FILE), format!("{version}\n")).await.unwrap();
        fs::write(dir.join("index.html"), version).await.unwrap();
    }

    #[test]
    fn test_sibling_paths() {
        let paths = InstallPaths::new("/srv/data/webUI");
        assert_eq!(paths.staging(), Path::new("/srv/data/.webUI.staging"));
        assert_eq!(paths.previous(), Path::new("/srv/data/.webUI.previous"));
        assert_eq!(paths.lock_file(), Path::new("/srv/data/.webUI.lock"));
        assert_eq!(paths.revision_file(), Path::new("/srv/data/webUI/revision"));
    }

    #[tokio::test]
    async fn test_read_revision_trims_and_handles_absence() {
        let temp = TempDir::new().unwrap();
        assert_eq!(read_revision(temp.path()).await.unwrap(), None);

        fs::write(temp.path().join(REVISION_FILE), "  r1234 \n").await.unwrap();
        assert_eq!(read_revision(temp.path()).await.unwrap().as_deref(), Some("r1234"));
    }

    #[tokio::test]
    async fn test_blank_revision_marker_reads_as_absent() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(REVISION_FILE), " \n").await.unwrap();
        assert_eq!(read_revision(temp.path()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_interrupted_swap_restores_previous() {
        let temp = TempDir::new().unwrap();
        let paths = InstallPaths::new(temp.path().join("webui"));
        install_dir(paths.previous(), "r1").await;

        assert_eq!(paths.recover_interrupted_swap().await.unwrap().as_deref(), Some("r1"));
        assert_eq!(read_revision(paths.root()).await.unwrap().as_deref(), Some("r1"));
        assert!(!paths.previous().exists());

        // Root present: nothing to recover.
        assert_eq!(paths.recover_interrupted_swap().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_interrupted_swap_leaves_existing_root_alone() {
        let temp = TempDir::new().unwrap();
        let paths = InstallPaths::new(temp.path().join("webui"));
        install_dir(paths.root(), "r2").await;
        install_dir(paths.previous(), "r1").await;

        assert_eq!(paths.recover_interrupted_swap().await.unwrap(), None);
        assert_eq!(read_revision(paths.root()).await.unwrap().as_deref(), Some("r2"));
        assert_eq!(paths.previous_version().await.as_deref(), Some("r1"));
    }

    #[tokio::test]
    async fn test_promote_into_empty_root() {
        let temp = TempDir::new().unwrap();
        let paths = InstallPaths::new(temp.path().join("webui"));

        paths.prepare_staging().await.unwrap();
        install_dir(paths.staging(), "r2").await;
        paths.promote_staging(true).await.unwrap();

        assert_eq!(read_revision(paths.root()).await.unwrap().as_deref(), Some("r2"));
        assert!(!paths.staging().exists());
        assert!(!paths.has_previous().await);
    }

    #[tokio::test]
    async fn test_promote_keeps_previous_and_rollback_toggles() {
        let temp = TempDir::new().unwrap();
        let paths = InstallPaths::new(temp.path().join("webui"));
        install_dir(paths.root(), "r1").await;

        paths.prepare_staging().await.unwrap();
        install_dir(paths.staging(), "r2").await;
        paths.promote_staging(true).await.unwrap();

        assert_eq!(read_revision(paths.root()).await.unwrap().as_deref(), Some("r2"));
        assert_eq!(paths.previous_version().await.as_deref(), Some("r1"));

        assert_eq!(paths.rollback().await.unwrap(), "r1");
        assert_eq!(read_revision(paths.root()).await.unwrap().as_deref(), Some("r1"));
        assert_eq!(paths.previous_version().await.as_deref(), Some("r2"));

        assert_eq!(paths.rollback().await.unwrap(), "r2");
        assert_eq!(read_revision(paths.root()).await.unwrap().as_deref(), Some("r2"));
    }

    #[tokio::test]
    async fn test_promote_without_keep_previous_discards_old_root() {
        let temp = TempDir::new().unwrap();
        let paths = InstallPaths::new(temp.path().join("webui"));
        install_dir(paths.root(), "r1").await;

        paths.prepare_staging().await.unwrap();
        install_dir(paths.staging(), "r2").await;
        paths.promote_staging(false).await.unwrap();

        assert!(!paths.previous().exists());
        let err = paths.rollback().await.unwrap_err();
        assert!(matches!(err, WebUiError::NoPreviousInstall { .. }));
    }

    #[tokio::test]
    async fn test_failed_promote_restores_current_root() {
        let temp = TempDir::new().unwrap();
        let paths = InstallPaths::new(temp.path().join("webui"));
        install_dir(paths.root(), "r1").await;

        // No staging directory: the second rename fails.
        let err = paths.promote_staging(true).await.unwrap_err();
        assert!(matches!(err, WebUiError::FileSystem { .. }));
        assert_eq!(read_revision(paths.root()).await.unwrap().as_deref(), Some("r1"));
    }

    #[tokio::test]
    async fn test_prepare_staging_clears_leftovers() {
        let temp = TempDir::new().unwrap();
        let paths = InstallPaths::new(temp.path().join("webui"));
        install_dir(paths.staging(), "stale").await;

        paths.prepare_staging().await.unwrap();

        assert!(paths.staging().exists());
        assert!(std::fs::read_dir(paths.staging()).unwrap().next().is_none());
    }
}

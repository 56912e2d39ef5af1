//! Install state machine.
//!
//! ```text
//! NoInstall ──────────────┐
//!                         ▼
//! Inspecting ──► NeedsInstall(reason) ──► Fetching ──► Extracting ──► Installed
//!     │                                      │             │
//!     ├──► UpToDate                          └──► Failed ◄─┘
//!     └──► Failed
//! ```
//!
//! [`InstallManager::inspect`] decides between `UpToDate` and
//! `NeedsInstall`; [`InstallManager::install`] carries a `NeedsInstall`
//! through to `Installed` or `Failed`. Every transition is logged and kept in
//! [`InstallManager::transitions`].
//!
//! A failed fetch leaves the installation root untouched. Extraction happens
//! in a staging directory, so a failed extraction also leaves the root
//! untouched; see [`crate::webui::swap`].

use crate::config::WebUiConfig;
use crate::constants::REVISION_FILE;
use crate::core::{Result, WebUiError};
use crate::version::BuildInfo;
use crate::webui::archive::extract_zip;
use crate::webui::checksum::BundleDigest;
use crate::webui::fetcher::{DownloadProgress, ReleaseFetcher};
use crate::webui::resolver::CompatibilityResolver;
use crate::webui::swap::{InstallPaths, read_revision};
use crate::webui::transport::Transport;
use std::fmt;
use std::path::Path;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Why an installation is about to be (re)placed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallReason {
    /// No revision marker under the root.
    Missing,
    /// Installed files do not match the declared digest, or no declared
    /// digest could be fetched. Reinstalls the same version.
    Corrupt { version: String },
    /// Auto-update found a different compatible version.
    Outdated { installed: String, available: String },
    /// Explicit request for a specific version.
    Forced { version: String },
}

impl InstallReason {
    /// Version this reason already pins, if any.
    pub fn pinned_version(&self) -> Option<&str> {
        match self {
            Self::Missing => None,
            Self::Corrupt {
                version,
            }
            | Self::Forced {
                version,
            } => Some(version),
            Self::Outdated {
                available,
                ..
            } => Some(available),
        }
    }
}

impl fmt::Display for InstallReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => write!(f, "missing"),
            Self::Corrupt {
                version,
            } => write!(f, "corrupt ({version})"),
            Self::Outdated {
                installed,
                available,
            } => write!(f, "outdated ({installed} -> {available})"),
            Self::Forced {
                version,
            } => write!(f, "forced ({version})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallState {
    NoInstall,
    Inspecting { version: String },
    UpToDate { version: String },
    NeedsInstall(InstallReason),
    Fetching { version: String },
    Extracting { version: String },
    Installed { version: String },
    Failed { reason: String },
}

impl InstallState {
    /// `UpToDate`, `Installed` and `Failed` end an invocation.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::UpToDate { .. } | Self::Installed { .. } | Self::Failed { .. })
    }
}

impl fmt::Display for InstallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoInstall => write!(f, "no installation"),
            Self::Inspecting {
                version,
            } => write!(f, "inspecting {version}"),
            Self::UpToDate {
                version,
            } => write!(f, "up to date ({version})"),
            Self::NeedsInstall(reason) => write!(f, "needs install: {reason}"),
            Self::Fetching {
                version,
            } => write!(f, "fetching {version}"),
            Self::Extracting {
                version,
            } => write!(f, "extracting {version}"),
            Self::Installed {
                version,
            } => write!(f, "installed {version}"),
            Self::Failed {
                reason,
            } => write!(f, "failed: {reason}"),
        }
    }
}

/// Drives one inspect/install cycle against an installation root.
///
/// Collaborators are injected: configuration, build information and the
/// network [`Transport`]. The manager does not lock the root; callers that
/// may run concurrently go through [`crate::webui::UpdateScheduler`].
pub struct InstallManager<'a, T: Transport> {
    config: &'a WebUiConfig,
    build: &'a BuildInfo,
    transport: &'a T,
    paths: InstallPaths,
    state: InstallState,
    transitions: Vec<InstallState>,
    progress: Option<watch::Sender<DownloadProgress>>,
}

impl<'a, T: Transport> InstallManager<'a, T> {
    pub fn new(config: &'a WebUiConfig, build: &'a BuildInfo, transport: &'a T) -> Self {
        Self {
            config,
            build,
            transport,
            paths: InstallPaths::new(&config.root),
            state: InstallState::NoInstall,
            transitions: Vec::new(),
            progress: None,
        }
    }

    /// Publish download progress of the next install on `sender`.
    #[must_use]
    pub fn with_progress(mut self, sender: watch::Sender<DownloadProgress>) -> Self {
        self.progress = Some(sender);
        self
    }

    pub fn state(&self) -> &InstallState {
        &self.state
    }

    /// Every state entered so far, oldest first.
    pub fn transitions(&self) -> &[InstallState] {
        &self.transitions
    }

    pub fn paths(&self) -> &InstallPaths {
        &self.paths
    }

    fn transition(&mut self, next: InstallState) {
        debug!(from = %self.state, to = %next, "Web UI install state");
        self.state = next.clone();
        self.transitions.push(next);
    }

    fn fail(&mut self, error: WebUiError) -> WebUiError {
        self.transition(InstallState::Failed {
            reason: error.to_string(),
        });
        error
    }

    fn resolver(&self) -> CompatibilityResolver<'a, T> {
        CompatibilityResolver::new(self.transport, &self.config.release, self.build)
    }

    fn fetcher(&self) -> ReleaseFetcher<'a, T> {
        ReleaseFetcher::new(self.transport, &self.config.release, self.config.download_dir())
    }

    /// Version the configured channel currently points at.
    pub async fn resolve_target(&self) -> Result<String> {
        self.resolver().resolve_target(self.config.channel).await
    }

    /// Examine the installation root and decide what to do.
    ///
    /// Ends in `UpToDate` or `NeedsInstall`. An unavailable declared digest
    /// counts as corruption. An empty revision marker counts as a missing
    /// installation. With auto-update on, an intact installation is kept when
    /// no compatible version is listed or the table cannot be reached.
    ///
    /// # Errors
    ///
    /// Local filesystem failures while reading the marker or digesting the
    /// root; the state becomes `Failed`.
    pub async fn inspect(&mut self) -> Result<InstallState> {
        if let Err(e) = self.paths.recover_interrupted_swap().await {
            return Err(self.fail(e));
        }

        let installed = match read_revision(self.paths.root()).await {
            Ok(installed) => installed,
            Err(e) => return Err(self.fail(e)),
        };

        let Some(version) = installed else {
            info!("No web UI installed at {}", self.paths.root().display());
            self.transition(InstallState::NoInstall);
            self.transition(InstallState::NeedsInstall(InstallReason::Missing));
            return Ok(self.state.clone());
        };

        self.transition(InstallState::Inspecting {
            version: version.clone(),
        });

        let local = match BundleDigest::compute(self.paths.root()).await {
            Ok(local) => local,
            Err(e) => return Err(self.fail(e)),
        };

        let intact = match self.fetcher().fetch_declared_digest(&version).await {
            Some(declared) => match BundleDigest::compare(&version, &declared, &local) {
                Ok(()) => true,
                Err(e) => {
                    warn!("{}", e);
                    false
                }
            },
            None => {
                warn!(%version, "Cannot verify web UI without declared digest, treating as invalid");
                false
            }
        };

        if !intact {
            self.transition(InstallState::NeedsInstall(InstallReason::Corrupt {
                version,
            }));
            return Ok(self.state.clone());
        }

        if self.config.auto_update {
            match self.resolver().resolve_update(self.config.channel).await {
                Ok(Some(available)) if available != version => {
                    info!("Web UI {} is available (installed {})", available, version);
                    self.transition(InstallState::NeedsInstall(InstallReason::Outdated {
                        installed: version,
                        available,
                    }));
                    return Ok(self.state.clone());
                }
                Ok(_) => {}
                Err(e) => warn!("Could not check for a newer web UI: {}", e),
            }
        }

        info!("Web UI {} is up to date", version);
        self.transition(InstallState::UpToDate {
            version,
        });
        Ok(self.state.clone())
    }

    /// Download, extract and swap in the bundle `reason` calls for.
    ///
    /// Returns the installed version. The root is replaced only once the
    /// whole bundle has been extracted, and any temporary archive or staging
    /// directory is removed either way.
    ///
    /// # Errors
    ///
    /// Resolution network failures, download failures, extraction failures
    /// and swap failures. The state becomes `Failed`.
    pub async fn install(&mut self, reason: InstallReason) -> Result<String> {
        if self.state != InstallState::NeedsInstall(reason.clone()) {
            self.transition(InstallState::NeedsInstall(reason.clone()));
        }

        let version = match reason.pinned_version() {
            Some(version) => version.to_string(),
            None => match self.resolve_target().await {
                Ok(version) => version,
                Err(e) => return Err(self.fail(e)),
            },
        };

        self.transition(InstallState::Fetching {
            version: version.clone(),
        });

        let mut fetcher = self.fetcher();
        if let Some(sender) = self.progress.take() {
            fetcher = fetcher.with_progress(sender);
        }
        let archive = match fetcher.download(&version).await {
            Ok(archive) => archive,
            Err(e) => return Err(self.fail(e)),
        };
        drop(fetcher);

        self.transition(InstallState::Extracting {
            version: version.clone(),
        });

        let result = self.extract_and_swap(&archive, &version).await;
        remove_archive(&archive).await;

        match result {
            Ok(()) => {
                info!("Installed web UI {}", version);
                self.transition(InstallState::Installed {
                    version: version.clone(),
                });
                Ok(version)
            }
            Err(e) => {
                self.paths.discard_staging().await;
                Err(self.fail(e))
            }
        }
    }

    async fn extract_and_swap(&self, archive: &Path, version: &str) -> Result<()> {
        self.paths.prepare_staging().await?;
        let files = extract_zip(archive, self.paths.staging()).await?;
        debug!(files, "Extracted web UI into staging");

        if read_revision(self.paths.staging()).await?.is_none() {
            let marker = self.paths.staging().join(REVISION_FILE);
            // The marker becomes part of the digested tree, so this bundle
            // will not match a digest declared over the archive contents.
            warn!(
                "Archive has no revision marker, writing {}; the installation will fail digest verification",
                version
            );
            tokio::fs::write(&marker, version)
                .await
                .map_err(|e| WebUiError::fs("write revision marker", &marker, e))?;
        }

        self.paths.promote_staging(self.config.keep_previous).await
    }

    /// Inspect, then install if needed. Returns the terminal state.
    ///
    /// # Errors
    ///
    /// Whatever [`inspect`](Self::inspect) or [`install`](Self::install)
    /// reports.
    pub async fn run(&mut self) -> Result<InstallState> {
        if let InstallState::NeedsInstall(reason) = self.inspect().await? {
            self.install(reason).await?;
        }
        Ok(self.state.clone())
    }
}

async fn remove_archive(archive: &Path) {
    match tokio::fs::remove_file(archive).await {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
            warn!("Failed to remove downloaded archive {}: {}", archive.display(), e);
        }
        _ => {}
    }
}

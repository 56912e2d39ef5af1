//! Entry point run at server startup and on demand.
//!
//! [`UpdateScheduler::setup`] never returns an error: failures are logged
//! and reported as [`SetupOutcome::Failed`], leaving whatever installation
//! existed in place. The web UI route is simply unavailable until a later
//! run succeeds.

use crate::config::WebUiConfig;
use crate::core::Result;
use crate::version::BuildInfo;
use crate::webui::fetcher::DownloadProgress;
use crate::webui::install::{InstallManager, InstallReason, InstallState};
use crate::webui::lock::InstallLock;
use crate::webui::resolver::CompatibilityResolver;
use crate::webui::swap::{InstallPaths, read_revision};
use crate::webui::transport::Transport;
use std::fmt;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Result of one [`UpdateScheduler::setup`] run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupOutcome {
    /// Engine disabled, or the bundle is managed externally.
    Skipped,
    UpToDate { version: String },
    Installed { version: String },
    Failed { reason: String },
}

impl SetupOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }
}

impl fmt::Display for SetupOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skipped => write!(f, "skipped"),
            Self::UpToDate {
                version,
            } => write!(f, "up to date ({version})"),
            Self::Installed {
                version,
            } => write!(f, "installed {version}"),
            Self::Failed {
                reason,
            } => write!(f, "failed: {reason}"),
        }
    }
}

/// Serialized access to the install engine for one configuration.
pub struct UpdateScheduler<'a, T: Transport> {
    config: &'a WebUiConfig,
    build: &'a BuildInfo,
    transport: &'a T,
}

impl<'a, T: Transport> UpdateScheduler<'a, T> {
    pub fn new(config: &'a WebUiConfig, build: &'a BuildInfo, transport: &'a T) -> Self {
        Self {
            config,
            build,
            transport,
        }
    }

    pub fn paths(&self) -> InstallPaths {
        InstallPaths::new(&self.config.root)
    }

    fn manager(&self, progress: Option<watch::Sender<DownloadProgress>>) -> InstallManager<'a, T> {
        let manager = InstallManager::new(self.config, self.build, self.transport);
        match progress {
            Some(sender) => manager.with_progress(sender),
            None => manager,
        }
    }

    /// Validate the installation and reinstall it when missing, corrupt or
    /// (with auto-update) outdated.
    pub async fn setup(&self, progress: Option<watch::Sender<DownloadProgress>>) -> SetupOutcome {
        if !self.config.is_managed() {
            info!("Web UI is not managed by this server, skipping setup");
            return SetupOutcome::Skipped;
        }

        let result: Result<InstallState> = async {
            let _lock = InstallLock::acquire(self.paths().lock_file()).await?;
            self.manager(progress).run().await
        }
        .await;

        outcome(result)
    }

    /// Install `version` (or the channel's target) regardless of the current
    /// installation's state.
    pub async fn force_install(
        &self,
        version: Option<String>,
        progress: Option<watch::Sender<DownloadProgress>>,
    ) -> SetupOutcome {
        if !self.config.is_managed() {
            info!("Web UI is not managed by this server, skipping install");
            return SetupOutcome::Skipped;
        }

        let result: Result<InstallState> = async {
            let _lock = InstallLock::acquire(self.paths().lock_file()).await?;
            let mut manager = self.manager(progress);
            let version = match version {
                Some(version) => version,
                None => manager.resolve_target().await?,
            };
            manager
                .install(InstallReason::Forced {
                    version,
                })
                .await?;
            Ok(manager.state().clone())
        }
        .await;

        outcome(result)
    }

    /// Inspect without installing anything.
    ///
    /// # Errors
    ///
    /// Local filesystem failures while inspecting.
    pub async fn inspect(&self) -> Result<InstallState> {
        let _lock = InstallLock::acquire(self.paths().lock_file()).await?;
        self.manager(None).inspect().await
    }

    /// Version currently recorded in the revision marker.
    pub async fn installed_version(&self) -> Result<Option<String>> {
        read_revision(&self.config.root).await
    }

    /// Newer version to offer, if any.
    ///
    /// Returns the channel's target when it differs from the installed
    /// version. A table without a compatible entry offers nothing, and every
    /// failure is logged and reported as "no update".
    pub async fn check_for_update(&self) -> Option<String> {
        let installed = match self.installed_version().await {
            Ok(installed) => installed,
            Err(e) => {
                warn!("Could not read installed web UI version: {}", e);
                return None;
            }
        };

        let resolver = CompatibilityResolver::new(self.transport, &self.config.release, self.build);
        match resolver.resolve_update(self.config.channel).await {
            Ok(Some(target)) if installed.as_deref() != Some(target.as_str()) => {
                info!(
                    "Web UI update available: {} -> {}",
                    installed.as_deref().unwrap_or("none"),
                    target
                );
                Some(target)
            }
            Ok(_) => None,
            Err(e) => {
                warn!("Could not check for web UI updates: {}", e);
                None
            }
        }
    }

    /// Swap the retained previous installation back into place.
    ///
    /// # Errors
    ///
    /// [`crate::core::WebUiError::NoPreviousInstall`] when nothing was retained.
    pub async fn rollback(&self) -> Result<String> {
        let paths = self.paths();
        let _lock = InstallLock::acquire(paths.lock_file()).await?;
        paths.rollback().await
    }
}

fn outcome(result: Result<InstallState>) -> SetupOutcome {
    match result {
        Ok(InstallState::Installed {
            version,
        }) => SetupOutcome::Installed {
            version,
        },
        Ok(InstallState::UpToDate {
            version,
        }) => SetupOutcome::UpToDate {
            version,
        },
        Ok(state) => SetupOutcome::Failed {
            reason: format!("install stopped in state '{state}'"),
        },
        Err(e) => {
            if e.is_network() {
                error!("Web UI setup failed, release store unreachable: {}", e);
            } else {
                error!("Web UI setup failed: {}", e);
            }
            SetupOutcome::Failed {
                reason: e.to_string(),
            }
        }
    }
}

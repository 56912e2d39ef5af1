//! State shared by the commands that talk to the release store.

use super::CliConfig;
use crate::config::WebUiConfig;
use crate::version::{BuildInfo, ServerRevision};
use crate::webui::{DownloadProgress, HttpTransport, UpdateScheduler};
use crate::utils::{DownloadBar, is_progress_disabled};
use anyhow::{Context, Result};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Loaded configuration, build information and HTTP transport.
pub struct CommandContext {
    pub config: WebUiConfig,
    pub build: BuildInfo,
    pub transport: HttpTransport,
    no_progress: bool,
}

impl CommandContext {
    pub async fn load(cli: &CliConfig) -> Result<Self> {
        let config = WebUiConfig::load_with_optional(cli.config_path.clone())
            .await
            .context("Failed to load web UI configuration")?;

        let mut build = BuildInfo::current().context("Invalid build information")?;
        if let Some(revision) = &cli.server_revision {
            let revision = ServerRevision::parse(revision)
                .with_context(|| format!("Invalid --server-revision '{revision}'"))?;
            build = build.with_server_revision(revision);
        }

        let transport =
            HttpTransport::new(&config.network).context("Failed to create HTTP client")?;

        Ok(Self {
            config,
            build,
            transport,
            no_progress: cli.no_progress || is_progress_disabled(),
        })
    }

    pub fn scheduler(&self) -> UpdateScheduler<'_, HttpTransport> {
        UpdateScheduler::new(&self.config, &self.build, &self.transport)
    }

    /// A progress sender plus the task rendering it, unless progress is off.
    pub fn download_progress(
        &self,
    ) -> (Option<watch::Sender<DownloadProgress>>, Option<(DownloadBar, JoinHandle<()>)>) {
        if self.no_progress {
            return (None, None);
        }

        let (tx, rx) = watch::channel(DownloadProgress::default());
        let bar = DownloadBar::new("Downloading web UI");
        let handle = bar.follow(rx);
        (Some(tx), Some((bar, handle)))
    }
}

/// Wait for the renderer to drain and clear the bar.
pub async fn finish_progress(progress: Option<(DownloadBar, JoinHandle<()>)>) {
    if let Some((bar, handle)) = progress {
        let _ = handle.await;
        bar.finish_and_clear();
    }
}

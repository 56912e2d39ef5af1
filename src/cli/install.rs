use super::CliConfig;
use super::common::{CommandContext, finish_progress};
use crate::webui::SetupOutcome;
use anyhow::{Result, bail};
use clap::Args;
use colored::Colorize;

/// Install a web UI bundle regardless of the current installation.
#[derive(Args, Debug)]
pub struct InstallCommand {
    /// Version tag to install instead of the channel's target.
    #[arg(long)]
    version: Option<String>,
}

impl InstallCommand {
    pub async fn execute(self, cli: &CliConfig) -> Result<()> {
        let ctx = CommandContext::load(cli).await?;
        let (sender, progress) = ctx.download_progress();

        let outcome = ctx.scheduler().force_install(self.version, sender).await;
        finish_progress(progress).await;

        match outcome {
            SetupOutcome::Installed {
                version,
            } => println!("{} {}", "Installed web UI".green(), version.bold()),
            SetupOutcome::Skipped => {
                println!("{}", "Web UI is disabled or externally managed, nothing to do".yellow());
            }
            SetupOutcome::UpToDate {
                version,
            } => println!("Web UI {version} already installed"),
            SetupOutcome::Failed {
                reason,
            } => bail!("Web UI install failed: {reason}"),
        }

        Ok(())
    }
}

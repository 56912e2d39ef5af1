use super::CliConfig;
use super::common::{CommandContext, finish_progress};
use crate::webui::SetupOutcome;
use anyhow::{Result, bail};
use clap::Args;
use colored::Colorize;

/// Run the startup check: validate, then reinstall if needed.
#[derive(Args, Debug)]
pub struct SetupCommand {}

impl SetupCommand {
    pub async fn execute(self, cli: &CliConfig) -> Result<()> {
        let ctx = CommandContext::load(cli).await?;
        let (sender, progress) = ctx.download_progress();

        let outcome = ctx.scheduler().setup(sender).await;
        finish_progress(progress).await;

        match outcome {
            SetupOutcome::Skipped => {
                println!("{}", "Web UI is disabled or externally managed, nothing to do".yellow());
            }
            SetupOutcome::UpToDate {
                version,
            } => println!("{} {}", "Web UI is up to date:".green(), version),
            SetupOutcome::Installed {
                version,
            } => println!("{} {}", "Installed web UI".green(), version.bold()),
            SetupOutcome::Failed {
                reason,
            } => bail!("Web UI setup failed: {reason}"),
        }

        Ok(())
    }
}

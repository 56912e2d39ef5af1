use super::CliConfig;
use super::common::CommandContext;
use crate::webui::{InstallReason, InstallState};
use anyhow::{Result, bail};
use clap::Args;
use colored::Colorize;

/// Compare the installation against the digest declared by the release store.
#[derive(Args, Debug)]
pub struct VerifyCommand {}

impl VerifyCommand {
    pub async fn execute(self, cli: &CliConfig) -> Result<()> {
        let ctx = CommandContext::load(cli).await?;

        match ctx.scheduler().inspect().await? {
            InstallState::UpToDate {
                version,
            } => {
                println!("{} {}", "✓ Web UI is intact:".green(), version);
                Ok(())
            }
            InstallState::NeedsInstall(InstallReason::Missing) => {
                bail!("No web UI installed at {}", ctx.config.root.display())
            }
            InstallState::NeedsInstall(InstallReason::Outdated {
                installed,
                available,
            }) => {
                println!("{} {}", "✓ Web UI is intact:".green(), installed);
                println!("{} {}", "Newer compatible version:".yellow(), available);
                Ok(())
            }
            InstallState::NeedsInstall(reason) => {
                bail!("Web UI failed verification ({reason}); run `webui install` to repair it")
            }
            state => bail!("Unexpected web UI state: {state}"),
        }
    }
}

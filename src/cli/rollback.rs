use super::CliConfig;
use super::common::CommandContext;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

/// Swap the previously installed web UI back into place.
#[derive(Args, Debug)]
pub struct RollbackCommand {}

impl RollbackCommand {
    pub async fn execute(self, cli: &CliConfig) -> Result<()> {
        let ctx = CommandContext::load(cli).await?;

        println!("{}", "Rolling back to the previous web UI...".yellow());
        let version = ctx.scheduler().rollback().await.context("Rollback failed")?;
        println!("{} {}", "Restored web UI".green(), version.bold());

        Ok(())
    }
}

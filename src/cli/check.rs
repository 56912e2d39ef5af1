use super::CliConfig;
use super::common::CommandContext;
use anyhow::Result;
use clap::Args;
use colored::Colorize;

/// Report whether the channel points at a different version than the installed one.
#[derive(Args, Debug)]
pub struct CheckCommand {}

impl CheckCommand {
    pub async fn execute(self, cli: &CliConfig) -> Result<()> {
        let ctx = CommandContext::load(cli).await?;
        let scheduler = ctx.scheduler();
        let installed = scheduler.installed_version().await?;

        println!("{}", "Checking for web UI updates...".cyan());
        match scheduler.check_for_update().await {
            Some(available) => {
                println!(
                    "{} {} -> {}",
                    "Update available:".green().bold(),
                    installed.as_deref().unwrap_or("none"),
                    available.green()
                );
                println!("Run `webui install` to install it");
            }
            None => println!(
                "{} ({})",
                "No update available".green(),
                installed.as_deref().unwrap_or("not installed")
            ),
        }

        Ok(())
    }
}

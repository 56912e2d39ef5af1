use super::CliConfig;
use super::common::CommandContext;
use anyhow::Result;
use clap::Args;
use colored::Colorize;

/// Print configuration and installed versions. Never touches the network.
#[derive(Args, Debug)]
pub struct StatusCommand {}

impl StatusCommand {
    pub async fn execute(self, cli: &CliConfig) -> Result<()> {
        let ctx = CommandContext::load(cli).await?;
        let scheduler = ctx.scheduler();
        let paths = scheduler.paths();
        let config = &ctx.config;

        let managed = if config.is_managed() {
            "managed".green()
        } else {
            "not managed".yellow()
        };

        println!("{}", "Web UI status".bold());
        println!("  {:<16} {}", "engine:", managed);
        println!("  {:<16} {}", "channel:", config.channel);
        println!("  {:<16} {}", "auto update:", config.auto_update);
        println!("  {:<16} {}", "server revision:", ctx.build.server_revision);
        println!("  {:<16} {}", "bundled version:", ctx.build.bundled_ui_tag);
        println!("  {:<16} {}", "root:", paths.root().display());

        let installed = scheduler.installed_version().await?;
        println!(
            "  {:<16} {}",
            "installed:",
            installed.as_deref().map_or_else(|| "none".red(), |v| v.normal())
        );
        if let Some(previous) = paths.previous_version().await {
            println!("  {:<16} {}", "previous:", previous);
        }

        Ok(())
    }
}

//! Command-line interface for the web UI manager.
//!
//! The `webui` binary runs the update engine on demand, outside the server
//! startup sequence. Every command loads the same configuration file the
//! server uses.
//!
//! # Commands
//!
//! - `setup` - validate the installation and reinstall it when needed
//! - `status` - show configuration and installed versions (offline)
//! - `check` - report whether a different compatible version is available
//! - `install` - (re)install the channel's version or a pinned one
//! - `verify` - compare the installation against its declared digest
//! - `digest` - print the bundle digest of any directory
//! - `rollback` - restore the installation replaced by the last install
//!
//! # Global Options
//!
//! - `--verbose` / `--quiet` - log level (`RUST_LOG` still wins)
//! - `--config` - configuration file path
//! - `--no-progress` - hide progress bars
//! - `--server-revision` - override the compiled-in server revision
//!
//! # Example
//!
//! ```bash
//! webui --server-revision r1500 check
//! webui install --version r1200
//! webui digest ./dist
//! ```

mod check;
mod common;
mod digest;
mod install;
mod rollback;
mod setup;
mod status;
mod verify;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use common::CommandContext;

/// Runtime options derived from the global flags.
///
/// Passed to every command so tests and programmatic callers can drive the
/// CLI without touching the process environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliConfig {
    /// Filter directive for the log subscriber when `RUST_LOG` is unset.
    pub log_level: Option<String>,

    /// Hide progress bars.
    pub no_progress: bool,

    /// Configuration file to load instead of the default location.
    pub config_path: Option<PathBuf>,

    /// Server revision overriding the one compiled into the binary.
    pub server_revision: Option<String>,
}

impl CliConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Directive used when `RUST_LOG` is not set.
    pub fn log_directive(&self) -> String {
        self.log_level.clone().unwrap_or_else(|| "error".to_string())
    }
}

/// Manage the web UI bundle served by the server.
#[derive(Parser, Debug)]
#[command(
    name = "webui",
    about = "Resolve, verify and update the server's web UI bundle",
    version,
    long_about = "Keeps the locally installed web UI bundle compatible with the running server, \
                  verifying it against the release store and reinstalling it when needed."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only print errors.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to the configuration file.
    ///
    /// Defaults to `WEBUI_CONFIG_PATH`, then
    /// `<config_dir>/webui-manager/config.toml`.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Disable progress bars.
    #[arg(long, global = true)]
    no_progress: bool,

    /// Server revision (`r<number>`) to resolve against instead of the
    /// compiled-in one.
    #[arg(long, global = true, value_name = "REVISION")]
    server_revision: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate the installation and reinstall it when missing, corrupt or outdated.
    Setup(setup::SetupCommand),

    /// Show configuration and installed versions without network access.
    Status(status::StatusCommand),

    /// Check whether a different compatible web UI version is available.
    Check(check::CheckCommand),

    /// Install the channel's web UI version, or a specific one.
    Install(install::InstallCommand),

    /// Verify the installation against the digest declared by the release store.
    Verify(verify::VerifyCommand),

    /// Print the bundle digest of a directory.
    Digest(digest::DigestCommand),

    /// Restore the installation replaced by the last install.
    Rollback(rollback::RollbackCommand),
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        self.execute_with_config(config).await
    }

    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some("webui_manager=debug,webui=debug".to_string())
        } else if self.quiet {
            Some("error".to_string())
        } else {
            Some("webui_manager=info,webui=info,warn".to_string())
        };

        CliConfig {
            log_level,
            no_progress: self.no_progress || self.quiet,
            config_path: self.config.clone(),
            server_revision: self.server_revision.clone(),
        }
    }

    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        match self.command {
            Commands::Setup(cmd) => cmd.execute(&config).await,
            Commands::Status(cmd) => cmd.execute(&config).await,
            Commands::Check(cmd) => cmd.execute(&config).await,
            Commands::Install(cmd) => cmd.execute(&config).await,
            Commands::Verify(cmd) => cmd.execute(&config).await,
            Commands::Digest(cmd) => cmd.execute().await,
            Commands::Rollback(cmd) => cmd.execute(&config).await,
        }
    }
}

//! Web UI Manager - release resolution and self-update for a server's web UI
//!
//! A long-running server serves a detachable, versioned static bundle to
//! browsers. This crate keeps the locally installed bundle compatible with the
//! running server and intact on disk:
//!
//! 1. pick the bundle version for the configured release channel from a
//!    remote, order-significant compatibility table
//! 2. digest the installed tree and compare it with the digest the release
//!    store declares for that version
//! 3. download, extract and swap in a fresh bundle when the installation is
//!    missing, corrupt or (with auto-update) outdated
//!
//! # Modules
//!
//! - [`webui`] - the engine: resolver, checksum, fetcher, install state machine
//!   and the [`webui::UpdateScheduler`] entry point
//! - [`config`] - the TOML configuration consumed by the engine
//! - [`version`] - `r<number>` server revisions and compiled-in build info
//! - [`core`] - error taxonomy and user-facing error rendering
//! - [`cli`] - the `webui` command-line front end
//! - [`utils`] - progress rendering
//!
//! # Example
//!
//! ```rust,no_run
//! use webui_manager::config::WebUiConfig;
//! use webui_manager::version::BuildInfo;
//! use webui_manager::webui::{HttpTransport, UpdateScheduler};
//!
//! # async fn startup() -> anyhow::Result<()> {
//! let config = WebUiConfig::load().await?;
//! let build = BuildInfo::current()?;
//! let transport = HttpTransport::new(&config.network)?;
//!
//! let outcome = UpdateScheduler::new(&config, &build, &transport).setup(None).await;
//! if outcome.is_success() {
//!     // mount the web UI route
//! }
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod utils;
pub mod version;
pub mod webui;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

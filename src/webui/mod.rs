//! Web UI release resolution and self-update engine.
//!
//! The server serves a detachable, versioned static bundle. This module
//! decides which bundle version fits the running server, checks that the
//! installed copy is intact and replaces it when it is missing, corrupt or
//! outdated.
//!
//! # Components
//!
//! - [`checksum`] - order-independent digest of a directory tree
//! - [`resolver`] - walks the remote compatibility table for a [`ReleaseChannel`]
//! - [`fetcher`] - downloads archives and declared digests, publishing progress
//! - [`install`] - the inspect/install state machine
//! - [`setup`] - the [`UpdateScheduler`] entry point used at startup and on demand
//!
//! Supporting pieces: [`transport`] abstracts the network, [`archive`]
//! unpacks zips, [`swap`] replaces the root via a staging directory and
//! [`lock`] serializes concurrent runs.
//!
//! # Example
//!
//! ```rust,no_run
//! use webui_manager::config::WebUiConfig;
//! use webui_manager::version::BuildInfo;
//! use webui_manager::webui::{HttpTransport, SetupOutcome, UpdateScheduler};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = WebUiConfig::load().await?;
//! let build = BuildInfo::current()?;
//! let transport = HttpTransport::new(&config.network)?;
//!
//! match UpdateScheduler::new(&config, &build, &transport).setup(None).await {
//!     SetupOutcome::Failed { reason } => eprintln!("web UI unavailable: {reason}"),
//!     outcome => println!("web UI {outcome}"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod channel;
pub mod checksum;
pub mod fetcher;
pub mod install;
pub mod lock;
pub mod resolver;
pub mod setup;
pub mod swap;
pub mod transport;

pub use channel::{ReleaseChannel, WebUiFlavor};
pub use checksum::BundleDigest;
pub use fetcher::{DownloadJob, DownloadProgress, ReleaseFetcher};
pub use install::{InstallManager, InstallReason, InstallState};
pub use resolver::{CompatibilityEntry, CompatibilityResolver};
pub use setup::{SetupOutcome, UpdateScheduler};
pub use swap::InstallPaths;
pub use transport::{HttpTransport, Transport};

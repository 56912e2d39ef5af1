//! Terminal helpers for the `webui` binary.
//!
//! - [`progress`] - renders download progress snapshots with `indicatif`

pub mod progress;

pub use progress::{DownloadBar, is_progress_disabled};

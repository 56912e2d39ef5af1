//! Terminal rendering of download progress.
//!
//! The engine publishes [`DownloadProgress`] snapshots on a watch channel;
//! [`DownloadBar::follow`] turns them into an `indicatif` bar. Bars are hidden
//! when `WEBUI_NO_PROGRESS` is set (the `--no-progress` flag sets it).

use crate::constants::NO_PROGRESS_ENV;
use crate::webui::DownloadProgress;
use indicatif::{ProgressBar as IndicatifBar, ProgressStyle};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Checks if progress bars should be disabled.
pub fn is_progress_disabled() -> bool {
    std::env::var(NO_PROGRESS_ENV).is_ok()
}

/// Byte-count bar for one archive download.
#[derive(Clone)]
pub struct DownloadBar {
    inner: IndicatifBar,
}

impl DownloadBar {
    pub fn new(message: impl Into<String>) -> Self {
        let bar = if is_progress_disabled() {
            IndicatifBar::hidden()
        } else {
            let bar = IndicatifBar::new_spinner();
            bar.set_style(spinner_style());
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        };
        bar.set_message(message.into());
        Self {
            inner: bar,
        }
    }

    pub fn hidden() -> Self {
        Self {
            inner: IndicatifBar::hidden(),
        }
    }

    pub fn is_hidden(&self) -> bool {
        self.inner.is_hidden()
    }

    /// Show `snapshot`. The first snapshot with a known total turns the
    /// spinner into a bar.
    pub fn update(&self, snapshot: &DownloadProgress) {
        if let Some(total) = snapshot.total_bytes {
            if self.inner.length() != Some(total) {
                self.inner.set_length(total);
                self.inner.set_style(bar_style());
            }
        }
        self.inner.set_position(snapshot.bytes_transferred);
    }

    pub fn position(&self) -> u64 {
        self.inner.position()
    }

    pub fn finish_with_message(&self, msg: impl Into<String>) {
        self.inner.finish_with_message(msg.into());
    }

    pub fn finish_and_clear(&self) {
        self.inner.finish_and_clear();
    }

    /// Render every snapshot published on `receiver` until its sender is
    /// dropped.
    pub fn follow(&self, mut receiver: watch::Receiver<DownloadProgress>) -> JoinHandle<()> {
        let bar = self.clone();
        tokio::spawn(async move {
            while receiver.changed().await.is_ok() {
                let snapshot = *receiver.borrow_and_update();
                bar.update(&snapshot);
            }
        })
    }
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("━╸━")
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner:.cyan} {msg} {bytes}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
}

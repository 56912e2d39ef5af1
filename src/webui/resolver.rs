//! Picking the web UI version compatible with the running server.
//!
//! The release store publishes a compatibility table: a JSON array of
//! `{ "uiVersion": ..., "serverVersion": ... }` entries, where
//! `serverVersion` is the minimum server revision the UI version needs.
//! The table is authored in precedence order and is walked exactly in that
//! order; the first entry the running server satisfies wins. Reordering the
//! table remotely changes the outcome, so it is never sorted here.
//!
//! The table is fetched fresh on every resolution.

use crate::config::ReleaseEndpoints;
use crate::constants::PREVIEW_SENTINEL;
use crate::core::{Result, WebUiError};
use crate::version::{BuildInfo, ServerRevision};
use crate::webui::channel::ReleaseChannel;
use crate::webui::transport::Transport;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// One row of the compatibility table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompatibilityEntry {
    #[serde(rename = "uiVersion")]
    pub ui_version: String,
    /// Minimum server revision (`r<number>`) required by `ui_version`.
    #[serde(rename = "serverVersion", alias = "minServerVersion")]
    pub min_server_version: String,
}

impl CompatibilityEntry {
    pub fn new(ui_version: impl Into<String>, min_server_version: impl Into<String>) -> Self {
        Self {
            ui_version: ui_version.into(),
            min_server_version: min_server_version.into(),
        }
    }

    pub fn is_preview(&self) -> bool {
        self.ui_version == PREVIEW_SENTINEL
    }
}

/// First entry of `table`, in table order, compatible with `current`.
///
/// The preview sentinel is only eligible on the preview channel. Entries
/// with an unparsable server revision are skipped.
pub fn select_compatible<'t>(
    table: &'t [CompatibilityEntry],
    channel: ReleaseChannel,
    current: &ServerRevision,
) -> Option<&'t CompatibilityEntry> {
    for entry in table {
        if entry.is_preview() && channel != ReleaseChannel::Preview {
            continue;
        }

        let min = match ServerRevision::parse(&entry.min_server_version) {
            Ok(min) => min,
            Err(e) => {
                warn!("Skipping compatibility entry {}: {}", entry.ui_version, e);
                continue;
            }
        };

        if min <= *current {
            return Some(entry);
        }
    }

    None
}

/// Resolves release channels to concrete web UI versions.
pub struct CompatibilityResolver<'a, T: Transport> {
    transport: &'a T,
    endpoints: &'a ReleaseEndpoints,
    build: &'a BuildInfo,
}

impl<'a, T: Transport> CompatibilityResolver<'a, T> {
    pub fn new(transport: &'a T, endpoints: &'a ReleaseEndpoints, build: &'a BuildInfo) -> Self {
        Self {
            transport,
            endpoints,
            build,
        }
    }

    /// Download and parse the compatibility table.
    pub async fn fetch_table(&self) -> Result<Vec<CompatibilityEntry>> {
        let url = &self.endpoints.mapping_url;
        let body = self.transport.get_text(url).await?;
        serde_json::from_str(&body).map_err(|e| WebUiError::MalformedResponse {
            url: url.clone(),
            reason: e.to_string(),
        })
    }

    /// Version selected for `channel` on a server at `current`.
    ///
    /// May return the preview sentinel; see [`resolve_target`](Self::resolve_target)
    /// for a downloadable tag.
    ///
    /// # Errors
    ///
    /// - [`WebUiError::Resolution`] if no table entry accepts `current`
    /// - [`WebUiError::Network`] / [`WebUiError::MalformedResponse`] if the
    ///   table cannot be fetched or parsed
    pub async fn resolve(&self, channel: ReleaseChannel, current: &ServerRevision) -> Result<String> {
        if channel == ReleaseChannel::Bundled {
            debug!("Bundled channel pins web UI {}", self.build.bundled_ui_tag);
            return Ok(self.build.bundled_ui_tag.clone());
        }

        let table = self.fetch_table().await?;
        debug!(%channel, server = %current, entries = table.len(), "Resolving web UI version");

        select_compatible(&table, channel, current)
            .map(|entry| entry.ui_version.clone())
            .ok_or_else(|| WebUiError::Resolution {
                server_revision: current.to_string(),
            })
    }

    /// Concrete tag behind the preview sentinel.
    pub async fn fetch_preview_tag(&self) -> Result<String> {
        #[derive(Deserialize)]
        struct ReleaseInfo {
            tag_name: Option<String>,
        }

        let url = &self.endpoints.preview_info_url;
        let body = self.transport.get_text(url).await?;
        let info: ReleaseInfo =
            serde_json::from_str(&body).map_err(|e| WebUiError::MalformedResponse {
                url: url.clone(),
                reason: e.to_string(),
            })?;

        match info.tag_name.map(|t| t.trim().to_string()) {
            Some(tag) if !tag.is_empty() => Ok(tag),
            _ => Err(WebUiError::MalformedResponse {
                url: url.clone(),
                reason: "missing tag_name".to_string(),
            }),
        }
    }

    /// Downloadable version for `channel` on the running server.
    ///
    /// A [`WebUiError::Resolution`] falls back to the build's bundled tag;
    /// the preview sentinel is replaced by the current preview tag. Network
    /// failures propagate.
    pub async fn resolve_target(&self, channel: ReleaseChannel) -> Result<String> {
        let current = &self.build.server_revision;
        let version = match self.resolve(channel, current).await {
            Ok(version) => version,
            Err(WebUiError::Resolution {
                ..
            }) => {
                warn!(
                    "No compatible web UI version for server {}, falling back to bundled {}",
                    current, self.build.bundled_ui_tag
                );
                return Ok(self.build.bundled_ui_tag.clone());
            }
            Err(e) => return Err(e),
        };

        self.concrete(version).await
    }

    /// Version an update check should offer for `channel`.
    ///
    /// Unlike [`resolve_target`](Self::resolve_target) there is no bundled
    /// fallback: a table with no compatible entry means no update, so an
    /// intact installation is never downgraded to the bundled tag.
    pub async fn resolve_update(&self, channel: ReleaseChannel) -> Result<Option<String>> {
        let current = &self.build.server_revision;
        match self.resolve(channel, current).await {
            Ok(version) => self.concrete(version).await.map(Some),
            Err(WebUiError::Resolution {
                ..
            }) => {
                debug!("No compatible web UI version for server {}, no update", current);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn concrete(&self, version: String) -> Result<String> {
        if version == PREVIEW_SENTINEL {
            let tag = self.fetch_preview_tag().await?;
            info!("Latest preview web UI is {}", tag);
            return Ok(tag);
        }

        Ok(version)
    }
}

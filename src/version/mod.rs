//! Server revision tags and build-pinned version information.
//!
//! Server builds are identified by revision tags of the form `r<number>`
//! (for example `r1500`). Only the integer ordinal takes part in comparisons,
//! so `r0042` and `r42` are the same revision.

use crate::core::{Result, WebUiError};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Revision the binary was built for when `WEBUI_SERVER_REVISION` is unset at compile time.
const BUILD_SERVER_REVISION: &str = match option_env!("WEBUI_SERVER_REVISION") {
    Some(revision) => revision,
    None => "r0",
};

/// UI tag shipped with this build when `WEBUI_BUNDLED_TAG` is unset at compile time.
const BUILD_BUNDLED_TAG: &str = match option_env!("WEBUI_BUNDLED_TAG") {
    Some(tag) => tag,
    None => "r0",
};

/// A server revision tag (`r<number>`).
///
/// Equality and ordering use the numeric ordinal only; the original spelling
/// is kept for display.
#[derive(Debug, Clone)]
pub struct ServerRevision {
    tag: String,
    ordinal: u64,
}

impl ServerRevision {
    /// Parse a revision tag.
    ///
    /// # Errors
    ///
    /// Returns [`WebUiError::InvalidServerVersion`] unless the tag is `r`
    /// followed by a non-empty run of ASCII digits.
    pub fn parse(tag: &str) -> Result<Self> {
        let trimmed = tag.trim();
        let digits = trimmed.strip_prefix('r').unwrap_or_default();

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(WebUiError::InvalidServerVersion {
                tag: tag.to_string(),
            });
        }

        let ordinal = digits.parse::<u64>().map_err(|_| WebUiError::InvalidServerVersion {
            tag: tag.to_string(),
        })?;

        Ok(Self {
            tag: trimmed.to_string(),
            ordinal,
        })
    }

    pub fn ordinal(&self) -> u64 {
        self.ordinal
    }

    pub fn as_str(&self) -> &str {
        &self.tag
    }
}

impl FromStr for ServerRevision {
    type Err = WebUiError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl PartialEq for ServerRevision {
    fn eq(&self, other: &Self) -> bool {
        self.ordinal == other.ordinal
    }
}

impl Eq for ServerRevision {}

impl PartialOrd for ServerRevision {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ServerRevision {
    fn cmp(&self, other: &Self) -> Ordering {
        self.ordinal.cmp(&other.ordinal)
    }
}

impl fmt::Display for ServerRevision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tag)
    }
}

/// Version facts baked into the running server build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInfo {
    /// Revision of the running server.
    pub server_revision: ServerRevision,
    /// UI version shipped with (and pinned by) this server build.
    pub bundled_ui_tag: String,
}

impl BuildInfo {
    pub fn new(server_revision: ServerRevision, bundled_ui_tag: impl Into<String>) -> Self {
        Self {
            server_revision,
            bundled_ui_tag: bundled_ui_tag.into(),
        }
    }

    /// Build information compiled into this binary.
    ///
    /// # Errors
    ///
    /// Fails only if the binary was built with a malformed
    /// `WEBUI_SERVER_REVISION`.
    pub fn current() -> Result<Self> {
        Ok(Self::new(ServerRevision::parse(BUILD_SERVER_REVISION)?, BUILD_BUNDLED_TAG))
    }

    /// Replace the server revision, e.g. from `--server-revision`.
    #[must_use]
    pub fn with_server_revision(mut self, revision: ServerRevision) -> Self {
        self.server_revision = revision;
        self
    }
}

//! Release channels and bundle flavors.

use crate::core::WebUiError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Policy deciding which web UI version counts as "current".
///
/// Selected once from configuration at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseChannel {
    /// Pinned to the version shipped with the running server build.
    Bundled,
    /// Newest stable version compatible with the running server.
    #[default]
    Stable,
    /// Like stable, but the "latest preview" table entry is eligible too.
    Preview,
}

impl ReleaseChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bundled => "bundled",
            Self::Stable => "stable",
            Self::Preview => "preview",
        }
    }
}

impl fmt::Display for ReleaseChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReleaseChannel {
    type Err = WebUiError;

    /// Case-insensitive, so `STABLE` and `Stable` are accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bundled" => Ok(Self::Bundled),
            "stable" => Ok(Self::Stable),
            "preview" => Ok(Self::Preview),
            other => Err(WebUiError::Config {
                message: format!(
                    "unknown release channel '{other}' (expected bundled, stable or preview)"
                ),
            }),
        }
    }
}

impl<'de> Deserialize<'de> for ReleaseChannel {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Where the served bundle comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebUiFlavor {
    /// Managed by this engine.
    #[default]
    Default,
    /// Provided and maintained externally; the engine never touches it.
    Custom,
}

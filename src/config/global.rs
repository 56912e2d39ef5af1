//! Web UI manager configuration file.
//!
//! The configuration is a TOML file holding the values the engine consumes:
//! release channel, auto-update flag, installation root, the enable/flavor
//! switches and the release-store endpoints.
//!
//! # File Location
//!
//! 1. `--config <path>` on the command line
//! 2. `WEBUI_CONFIG_PATH` environment variable
//! 3. `<config_dir>/webui-manager/config.toml` (e.g. `~/.config` on Linux)
//!
//! A missing file is not an error; every field has a default.
//!
//! # File Format
//!
//! ```toml
//! enabled = true
//! flavor = "default"      # "custom" = externally managed bundle, engine disabled
//! channel = "stable"      # "bundled", "stable" or "preview"
//! auto_update = true
//! root = "~/.local/share/webui-manager/webui"
//! keep_previous = true
//!
//! [release]
//! releases_url = "https://github.com/webui-project/webui/releases"
//! mapping_url = "https://raw.githubusercontent.com/webui-project/webui/main/versionToServerVersionMapping.json"
//! preview_info_url = "https://api.github.com/repos/webui-project/webui-preview/releases/latest"
//! bundle_prefix = "WebUI"
//!
//! [network]
//! connect_timeout_secs = 30
//! read_timeout_secs = 60
//! ```

use crate::constants::{
    APP_DIR_NAME, CONFIG_PATH_ENV, DEFAULT_BUNDLE_PREFIX, DEFAULT_CONNECT_TIMEOUT_SECS,
    DEFAULT_READ_TIMEOUT_SECS, REVISION_FILE,
};
use crate::webui::channel::{ReleaseChannel, WebUiFlavor};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

/// Configuration consumed by the web UI engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebUiConfig {
    /// Master switch. When `false` the engine does nothing at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// `custom` marks an externally managed bundle the engine must not touch.
    #[serde(default)]
    pub flavor: WebUiFlavor,

    #[serde(default)]
    pub channel: ReleaseChannel,

    /// Replace an intact installation when a different compatible version exists.
    #[serde(default)]
    pub auto_update: bool,

    /// Installation root served as the web UI.
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Where release archives are downloaded. Defaults to the system temp dir.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tmp_dir: Option<PathBuf>,

    /// Retain the replaced installation next to the root for `rollback`.
    #[serde(default = "default_true")]
    pub keep_previous: bool,

    #[serde(default)]
    pub release: ReleaseEndpoints,

    #[serde(default)]
    pub network: NetworkConfig,
}

/// Shapes of the release-store endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseEndpoints {
    /// Base of the release store. Archives live under `<base>/download/<version>/`
    /// and `<base>/latest/download/`.
    #[serde(default = "default_releases_url")]
    pub releases_url: String,

    /// JSON array of `{ "uiVersion", "serverVersion" }` entries, in precedence order.
    #[serde(default = "default_mapping_url")]
    pub mapping_url: String,

    /// JSON document whose `tag_name` is the newest preview tag.
    #[serde(default = "default_preview_info_url")]
    pub preview_info_url: String,

    /// Archive files are named `<bundle_prefix>-<version>.zip`.
    #[serde(default = "default_bundle_prefix")]
    pub bundle_prefix: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_read_timeout_secs")]
    pub read_timeout_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_root() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR_NAME)
        .join("webui")
}

fn default_releases_url() -> String {
    "https://github.com/webui-project/webui/releases".to_string()
}

fn default_mapping_url() -> String {
    "https://raw.githubusercontent.com/webui-project/webui/main/versionToServerVersionMapping.json"
        .to_string()
}

fn default_preview_info_url() -> String {
    "https://api.github.com/repos/webui-project/webui-preview/releases/latest".to_string()
}

fn default_bundle_prefix() -> String {
    DEFAULT_BUNDLE_PREFIX.to_string()
}

const fn default_connect_timeout_secs() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}

const fn default_read_timeout_secs() -> u64 {
    DEFAULT_READ_TIMEOUT_SECS
}

impl Default for WebUiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            flavor: WebUiFlavor::default(),
            channel: ReleaseChannel::default(),
            auto_update: false,
            root: default_root(),
            tmp_dir: None,
            keep_previous: true,
            release: ReleaseEndpoints::default(),
            network: NetworkConfig::default(),
        }
    }
}

impl Default for ReleaseEndpoints {
    fn default() -> Self {
        Self {
            releases_url: default_releases_url(),
            mapping_url: default_mapping_url(),
            preview_info_url: default_preview_info_url(),
            bundle_prefix: default_bundle_prefix(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout_secs(),
            read_timeout_secs: default_read_timeout_secs(),
        }
    }
}

impl NetworkConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }
}

impl WebUiConfig {
    /// Configuration rooted at `root` with every other field defaulted.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Load from the default location, or defaults if no file exists.
    pub async fn load() -> Result<Self> {
        Self::load_with_optional(None).await
    }

    /// Load from `path` if given, otherwise from the default location.
    pub async fn load_with_optional(path: Option<PathBuf>) -> Result<Self> {
        let path = match path {
            Some(path) => path,
            None => Self::default_path()?,
        };

        if path.exists() {
            Self::load_from(&path).await
        } else {
            Ok(Self::default())
        }
    }

    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read web UI config from {}", path.display()))?;

        let mut config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse web UI config from {}", path.display()))?;
        config.root = expand_path(&config.root)?;
        if let Some(tmp_dir) = &config.tmp_dir {
            config.tmp_dir = Some(expand_path(tmp_dir)?);
        }

        Ok(config)
    }

    pub async fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize web UI config")?;

        fs::write(path, content)
            .await
            .with_context(|| format!("Failed to write web UI config to {}", path.display()))?;

        Ok(())
    }

    /// `WEBUI_CONFIG_PATH`, else `<config_dir>/webui-manager/config.toml`.
    pub fn default_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }

        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Unable to determine configuration directory"))?;

        Ok(config_dir.join(APP_DIR_NAME).join("config.toml"))
    }

    /// `false` when the engine must leave the installation root alone.
    #[must_use]
    pub fn is_managed(&self) -> bool {
        self.enabled && self.flavor != WebUiFlavor::Custom
    }

    /// Path of the revision marker inside the root.
    #[must_use]
    pub fn revision_file(&self) -> PathBuf {
        self.root.join(REVISION_FILE)
    }

    #[must_use]
    pub fn download_dir(&self) -> PathBuf {
        self.tmp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

fn expand_path(path: &Path) -> Result<PathBuf> {
    let raw = path.to_string_lossy();
    let expanded = shellexpand::full(&raw)
        .with_context(|| format!("Failed to expand path: {}", path.display()))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = WebUiConfig::default();
        assert!(config.enabled);
        assert!(config.is_managed());
        assert_eq!(config.channel, ReleaseChannel::Stable);
        assert!(!config.auto_update);
        assert!(config.keep_previous);
        assert_eq!(config.release.bundle_prefix, "WebUI");
        assert_eq!(config.network.connect_timeout(), Duration::from_secs(30));
        assert_eq!(config.network.read_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: WebUiConfig = toml::from_str(
            r#"
            channel = "preview"
            auto_update = true

            [release]
            bundle_prefix = "Tachi-UI"
            "#,
        )
        .unwrap();

        assert_eq!(config.channel, ReleaseChannel::Preview);
        assert!(config.auto_update);
        assert_eq!(config.release.bundle_prefix, "Tachi-UI");
        assert_eq!(config.release.releases_url, default_releases_url());
        assert_eq!(config.network, NetworkConfig::default());
    }

    #[test]
    fn test_custom_flavor_or_disabled_is_unmanaged() {
        let custom: WebUiConfig = toml::from_str("flavor = \"custom\"").unwrap();
        assert!(!custom.is_managed());

        let disabled: WebUiConfig = toml::from_str("enabled = false").unwrap();
        assert!(!disabled.is_managed());
    }

    #[tokio::test]
    async fn test_save_and_load_roundtrip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.toml");

        let mut config = WebUiConfig::with_root(temp.path().join("webui"));
        config.channel = ReleaseChannel::Bundled;
        config.keep_previous = false;
        config.save_to(&path).await.unwrap();

        let loaded = WebUiConfig::load_from(&path).await.unwrap();
        assert_eq!(loaded, config);
    }

    #[tokio::test]
    async fn test_load_missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let config =
            WebUiConfig::load_with_optional(Some(temp.path().join("absent.toml"))).await.unwrap();
        assert_eq!(config, WebUiConfig::default());
    }

    #[tokio::test]
    async fn test_load_rejects_invalid_toml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        tokio::fs::write(&path, "channel = [").await.unwrap();

        let err = WebUiConfig::load_from(&path).await.unwrap_err();
        assert!(err.to_string().contains("Failed to parse web UI config"));
    }
}

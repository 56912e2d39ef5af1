//! Configuration file discovery.

use serial_test::serial;
use tempfile::TempDir;
use webui_manager::config::WebUiConfig;
use webui_manager::webui::ReleaseChannel;

struct ConfigPathGuard;

impl ConfigPathGuard {
    fn set(path: &std::path::Path) -> Self {
        // SAFETY: serialized with every other test touching this variable.
        unsafe { std::env::set_var("WEBUI_CONFIG_PATH", path) };
        Self
    }
}

impl Drop for ConfigPathGuard {
    fn drop(&mut self) {
        // SAFETY: see `set`.
        unsafe { std::env::remove_var("WEBUI_CONFIG_PATH") };
    }
}

#[tokio::test]
#[serial]
async fn test_env_var_selects_config_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("webui.toml");
    std::fs::write(&path, "channel = \"PREVIEW\"\nauto_update = true\n").unwrap();
    let _guard = ConfigPathGuard::set(&path);

    assert_eq!(WebUiConfig::default_path().unwrap(), path);

    let config = WebUiConfig::load().await.unwrap();
    assert_eq!(config.channel, ReleaseChannel::Preview);
    assert!(config.auto_update);
}

#[tokio::test]
#[serial]
async fn test_missing_env_config_file_gives_defaults() {
    let temp = TempDir::new().unwrap();
    let _guard = ConfigPathGuard::set(&temp.path().join("absent.toml"));

    let config = WebUiConfig::load().await.unwrap();
    assert_eq!(config, WebUiConfig::default());
}

#[tokio::test]
async fn test_tilde_in_root_is_expanded() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("webui.toml");
    std::fs::write(&path, "root = \"~/webui-root\"\n").unwrap();

    let config = WebUiConfig::load_from(&path).await.unwrap();
    assert!(!config.root.to_string_lossy().starts_with('~'));
    assert!(config.root.ends_with("webui-root"));
}

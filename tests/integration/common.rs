//! Release-store scaffolding shared by the integration tests.

use std::path::Path;
use webui_manager::config::WebUiConfig;
use webui_manager::test_utils::{BundleFixture, FakeTransport};
use webui_manager::version::{BuildInfo, ServerRevision};

pub const RELEASES: &str = "https://releases.test/webui";
pub const MAPPING: &str = "https://releases.test/versionToServerVersionMapping.json";
pub const PREVIEW_INFO: &str = "https://releases.test/preview/latest.json";

/// Configuration rooted under `dir`, pointing at the fake release store.
pub fn test_config(dir: &Path) -> WebUiConfig {
    let mut config = WebUiConfig::with_root(dir.join("webUI"));
    config.tmp_dir = Some(dir.join("tmp"));
    config.release.releases_url = RELEASES.to_string();
    config.release.mapping_url = MAPPING.to_string();
    config.release.preview_info_url = PREVIEW_INFO.to_string();
    config
}

pub fn build_info(server: &str, bundled: &str) -> BuildInfo {
    BuildInfo::new(ServerRevision::parse(server).unwrap(), bundled)
}

pub fn archive_url(version: &str) -> String {
    format!("{RELEASES}/download/{version}/WebUI-{version}.zip")
}

pub fn digest_url(version: &str) -> String {
    format!("{RELEASES}/download/{version}/md5sum")
}

/// Mapping table JSON from `(uiVersion, serverVersion)` pairs, in order.
pub fn mapping(entries: &[(&str, &str)]) -> String {
    let rows: Vec<serde_json::Value> = entries
        .iter()
        .map(|(ui, server)| serde_json::json!({ "uiVersion": ui, "serverVersion": server }))
        .collect();
    serde_json::Value::Array(rows).to_string()
}

/// Publish `bundle` (archive and declared digest) on `transport`.
pub fn publish(transport: FakeTransport, bundle: &BundleFixture) -> FakeTransport {
    transport
        .with_bytes(&archive_url(&bundle.version), bundle.archive_bytes())
        .with_text(&digest_url(&bundle.version), &format!("{}\n", bundle.digest()))
}

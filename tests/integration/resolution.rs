//! Compatibility resolution through the public API.

use crate::common::{MAPPING, PREVIEW_INFO, build_info, mapping, test_config};
use webui_manager::core::WebUiError;
use webui_manager::test_utils::FakeTransport;
use webui_manager::version::ServerRevision;
use webui_manager::webui::{CompatibilityResolver, ReleaseChannel};

fn rev(tag: &str) -> ServerRevision {
    tag.parse().unwrap()
}

#[tokio::test]
async fn test_first_qualifying_entry_wins_in_table_order() {
    let temp = tempfile::TempDir::new().unwrap();
    let config = test_config(temp.path());
    let build = build_info("r5", "r0");
    let transport =
        FakeTransport::new().with_text(MAPPING, &mapping(&[("B", "r5"), ("A", "r1")]));
    let resolver = CompatibilityResolver::new(&transport, &config.release, &build);

    assert_eq!(resolver.resolve(ReleaseChannel::Stable, &rev("r5")).await.unwrap(), "B");
    assert_eq!(resolver.resolve(ReleaseChannel::Stable, &rev("r3")).await.unwrap(), "A");
    assert_eq!(resolver.resolve(ReleaseChannel::Preview, &rev("r3")).await.unwrap(), "A");
}

#[tokio::test]
async fn test_no_qualifying_entry_is_resolution_error() {
    let temp = tempfile::TempDir::new().unwrap();
    let config = test_config(temp.path());
    let build = build_info("r5", "r0");
    let transport =
        FakeTransport::new().with_text(MAPPING, &mapping(&[("B", "r50"), ("A", "r10")]));
    let resolver = CompatibilityResolver::new(&transport, &config.release, &build);

    let err = resolver.resolve(ReleaseChannel::Stable, &rev("r5")).await.unwrap_err();
    assert!(matches!(err, WebUiError::Resolution { .. }));
}

#[tokio::test]
async fn test_bundled_is_pinned_and_offline_for_any_server() {
    let temp = tempfile::TempDir::new().unwrap();
    let config = test_config(temp.path());
    let build = build_info("r5", "r777");
    let transport = FakeTransport::new();
    let resolver = CompatibilityResolver::new(&transport, &config.release, &build);

    for server in ["r0", "r1", "r99999"] {
        let version = resolver.resolve(ReleaseChannel::Bundled, &rev(server)).await.unwrap();
        assert_eq!(version, "r777");
    }
    assert_eq!(transport.request_count(), 0);
}

#[tokio::test]
async fn test_preview_channel_follows_latest_preview_tag() {
    let temp = tempfile::TempDir::new().unwrap();
    let config = test_config(temp.path());
    let build = build_info("r1500", "r1000");
    let transport = FakeTransport::new()
        .with_text(MAPPING, &mapping(&[("PREVIEW", "r1400"), ("r1200", "r1400")]))
        .with_text(PREVIEW_INFO, r#"{"tag_name":"r1260","prerelease":true}"#);
    let resolver = CompatibilityResolver::new(&transport, &config.release, &build);

    assert_eq!(resolver.resolve_target(ReleaseChannel::Preview).await.unwrap(), "r1260");
    assert_eq!(resolver.resolve_target(ReleaseChannel::Stable).await.unwrap(), "r1200");
}

//! End-to-end runs of the install engine against the fake release store.

use crate::common::{MAPPING, archive_url, build_info, digest_url, mapping, publish, test_config};
use std::fs;
use tempfile::TempDir;
use tokio::sync::watch;
use webui_manager::test_utils::{BundleFixture, FakeTransport, init_test_logging};
use webui_manager::webui::swap::read_revision;
use webui_manager::webui::{
    BundleDigest, DownloadProgress, InstallManager, InstallReason, InstallState, ReleaseChannel,
    SetupOutcome, UpdateScheduler,
};

fn release_r1200() -> BundleFixture {
    BundleFixture::new("r1200")
        .with_file("assets/index-abc.js", "console.log('web ui');")
        .with_file("assets/index-abc.css", "body { margin: 0 }")
        .with_file("locales/en.json", r#"{"hello":"Hello"}"#)
}

#[tokio::test]
async fn test_fresh_root_reaches_installed_with_declared_digest() {
    init_test_logging(None);
    let temp = TempDir::new().unwrap();
    let config = test_config(temp.path());
    let build = build_info("r1500", "r1000");
    let bundle = release_r1200();
    let transport = publish(
        FakeTransport::new().with_text(MAPPING, &mapping(&[("r1200", "r1400"), ("r900", "r1")])),
        &bundle,
    );

    let mut manager = InstallManager::new(&config, &build, &transport);
    let inspected = manager.inspect().await.unwrap();
    assert_eq!(inspected, InstallState::NeedsInstall(InstallReason::Missing));

    let installed = manager.install(InstallReason::Missing).await.unwrap();
    assert_eq!(installed, "r1200");
    assert_eq!(
        manager.state(),
        &InstallState::Installed {
            version: "r1200".to_string()
        }
    );

    let marker = fs::read_to_string(config.root.join("revision")).unwrap();
    assert_eq!(marker.trim(), "r1200");

    let local = BundleDigest::compute(&config.root).await.unwrap();
    assert_eq!(local, bundle.digest());
}

#[tokio::test]
async fn test_one_byte_change_after_install_is_corrupt() {
    let temp = TempDir::new().unwrap();
    let config = test_config(temp.path());
    let build = build_info("r1500", "r1000");
    let bundle = release_r1200();
    let transport = publish(
        FakeTransport::new().with_text(MAPPING, &mapping(&[("r1200", "r1")])),
        &bundle,
    );

    let mut manager = InstallManager::new(&config, &build, &transport);
    manager.run().await.unwrap();
    assert!(matches!(manager.state(), InstallState::Installed { .. }));

    let asset = config.root.join("assets/index-abc.js");
    let mut bytes = fs::read(&asset).unwrap();
    bytes[0] ^= 0x01;
    fs::write(&asset, bytes).unwrap();

    let mut second = InstallManager::new(&config, &build, &transport);
    let state = second.inspect().await.unwrap();
    assert_eq!(
        state,
        InstallState::NeedsInstall(InstallReason::Corrupt {
            version: "r1200".to_string()
        })
    );
}

#[tokio::test]
async fn test_digest_fetch_failure_on_intact_install_needs_install() {
    let temp = TempDir::new().unwrap();
    let config = test_config(temp.path());
    let build = build_info("r1500", "r1000");
    let bundle = release_r1200();
    bundle.write_to(&config.root);
    let transport = FakeTransport::new().with_failure(&digest_url("r1200"), "HTTP 502 Bad Gateway");

    let mut manager = InstallManager::new(&config, &build, &transport);
    let state = manager.inspect().await.unwrap();

    assert!(matches!(state, InstallState::NeedsInstall(_)));
    assert_ne!(
        state,
        InstallState::UpToDate {
            version: "r1200".to_string()
        }
    );
}

#[tokio::test]
async fn test_network_failure_during_fetch_leaves_previous_install() {
    let temp = TempDir::new().unwrap();
    let config = test_config(temp.path());
    let build = build_info("r1500", "r1000");
    let old = BundleFixture::new("r1100").with_file("app.js", "old");
    old.write_to(&config.root);
    std::fs::write(config.root.join("app.js"), "damaged").unwrap();

    // Old digest is published but the archive endpoint is down.
    let transport = FakeTransport::new()
        .with_text(&digest_url("r1100"), &old.digest())
        .with_failure(&archive_url("r1100"), "HTTP 503");

    let scheduler = UpdateScheduler::new(&config, &build, &transport);
    let outcome = scheduler.setup(None).await;

    assert!(matches!(outcome, SetupOutcome::Failed { .. }));
    assert_eq!(read_revision(&config.root).await.unwrap().as_deref(), Some("r1100"));
    assert_eq!(fs::read_to_string(config.root.join("app.js")).unwrap(), "damaged");
}

#[tokio::test]
async fn test_table_unreachable_on_missing_install_fails_without_creating_root() {
    let temp = TempDir::new().unwrap();
    let config = test_config(temp.path());
    let build = build_info("r1500", "r1000");
    let transport = FakeTransport::new();

    let outcome = UpdateScheduler::new(&config, &build, &transport).setup(None).await;

    assert!(matches!(outcome, SetupOutcome::Failed { .. }));
    assert!(!config.root.exists());
    assert_eq!(transport.requests(), vec![MAPPING.to_string()]);
}

#[tokio::test]
async fn test_no_compatible_version_installs_bundled_tag() {
    let temp = TempDir::new().unwrap();
    let config = test_config(temp.path());
    let build = build_info("r10", "r1000");
    let bundled = BundleFixture::new("r1000");
    let transport = publish(
        FakeTransport::new().with_text(MAPPING, &mapping(&[("r1200", "r1400")])),
        &bundled,
    );

    let outcome = UpdateScheduler::new(&config, &build, &transport).setup(None).await;

    assert_eq!(
        outcome,
        SetupOutcome::Installed {
            version: "r1000".to_string()
        }
    );
}

#[tokio::test]
async fn test_bundled_channel_setup_never_reads_mapping() {
    let temp = TempDir::new().unwrap();
    let mut config = test_config(temp.path());
    config.channel = ReleaseChannel::Bundled;
    let build = build_info("r1500", "r1000");
    let bundled = BundleFixture::new("r1000");
    let transport = publish(FakeTransport::new(), &bundled);

    let outcome = UpdateScheduler::new(&config, &build, &transport).setup(None).await;

    assert!(outcome.is_success());
    assert!(!transport.requests().iter().any(|url| url == MAPPING));
}

#[tokio::test]
async fn test_auto_update_replaces_and_rollback_restores() {
    let temp = TempDir::new().unwrap();
    let mut config = test_config(temp.path());
    config.auto_update = true;
    let build = build_info("r1500", "r1000");
    let old = BundleFixture::new("r1100");
    let new = release_r1200();
    old.write_to(&config.root);

    let transport = publish(
        publish(
            FakeTransport::new().with_text(MAPPING, &mapping(&[("r1200", "r1400")])),
            &old,
        ),
        &new,
    );
    let scheduler = UpdateScheduler::new(&config, &build, &transport);

    assert_eq!(
        scheduler.setup(None).await,
        SetupOutcome::Installed {
            version: "r1200".to_string()
        }
    );
    assert_eq!(BundleDigest::compute(&config.root).await.unwrap(), new.digest());

    assert_eq!(scheduler.rollback().await.unwrap(), "r1100");
    assert_eq!(scheduler.installed_version().await.unwrap().as_deref(), Some("r1100"));
    assert_eq!(BundleDigest::compute(&config.root).await.unwrap(), old.digest());
}

#[tokio::test]
async fn test_progress_is_monotonic_and_completes() {
    let temp = TempDir::new().unwrap();
    let config = test_config(temp.path());
    let build = build_info("r1500", "r1000");
    let payload: String = (0..20_000).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
    let bundle = BundleFixture::new("r1200").with_file("big.js", payload);
    let transport = publish(
        FakeTransport::new()
            .with_chunk_size(512)
            .with_text(MAPPING, &mapping(&[("r1200", "r1")])),
        &bundle,
    );

    let (tx, mut rx) = watch::channel(DownloadProgress::default());
    let observer = tokio::spawn(async move {
        let mut seen = Vec::new();
        while rx.changed().await.is_ok() {
            seen.push(*rx.borrow_and_update());
        }
        seen
    });

    let outcome = UpdateScheduler::new(&config, &build, &transport).setup(Some(tx)).await;
    assert!(outcome.is_success());

    let seen = observer.await.unwrap();
    let percents: Vec<u8> = seen.iter().filter_map(DownloadProgress::percent).collect();
    assert!(percents.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(percents.last(), Some(&100));
}

//! `webui` binary tests. None of these reach the network.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use webui_manager::test_utils::BundleFixture;

fn webui() -> Command {
    let mut cmd = Command::cargo_bin("webui").unwrap();
    cmd.env_remove("RUST_LOG").env_remove("WEBUI_CONFIG_PATH").env("WEBUI_NO_PROGRESS", "1");
    cmd
}

fn write_config(dir: &Path, extra: &str) -> std::path::PathBuf {
    let path = dir.join("config.toml");
    let root = dir.join("webUI");
    let content = format!(
        "root = {root:?}\n{extra}\n\n[release]\nreleases_url = \"http://127.0.0.1:9/webui\"\nmapping_url = \"http://127.0.0.1:9/mapping.json\"\n",
        root = root.display().to_string(),
    );
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_digest_prints_bundle_digest() {
    let temp = TempDir::new().unwrap();
    let bundle = BundleFixture::new("r1200").with_file("assets/app.js", "let a = 1;");
    let dist = temp.path().join("dist");
    bundle.write_to(&dist);

    webui()
        .arg("digest")
        .arg(&dist)
        .assert()
        .success()
        .stdout(predicate::str::diff(format!("{}\n", bundle.digest())));
}

#[test]
fn test_digest_of_empty_directory_is_md5_of_empty_string() {
    let temp = TempDir::new().unwrap();

    webui()
        .arg("digest")
        .arg(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("d41d8cd98f00b204e9800998ecf8427e"));
}

#[test]
fn test_digest_expected_mismatch_fails() {
    let temp = TempDir::new().unwrap();
    BundleFixture::new("r1").write_to(temp.path());

    webui()
        .arg("digest")
        .arg(temp.path())
        .args(["--expected", "00000000000000000000000000000000"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Integrity mismatch"));
}

#[test]
fn test_setup_with_disabled_engine_does_nothing() {
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path(), "enabled = false");

    webui()
        .arg("--config")
        .arg(&config)
        .arg("setup")
        .assert()
        .success()
        .stdout(predicate::str::contains("nothing to do"));

    assert!(!temp.path().join("webUI").exists());
}

#[test]
fn test_status_is_offline() {
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path(), "channel = \"bundled\"");
    BundleFixture::new("r1100").write_to(&temp.path().join("webUI"));

    webui()
        .arg("--config")
        .arg(&config)
        .args(["--server-revision", "r1500", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("bundled"))
        .stdout(predicate::str::contains("r1500"))
        .stdout(predicate::str::contains("r1100"));
}

#[test]
fn test_invalid_server_revision_is_rejected() {
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path(), "");

    webui()
        .arg("--config")
        .arg(&config)
        .args(["--server-revision", "v1.2.3", "status"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid --server-revision"));
}

#[test]
fn test_rollback_without_previous_install_fails_with_hint() {
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path(), "");

    webui()
        .arg("--config")
        .arg(&config)
        .arg("rollback")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No previous web UI installation"))
        .stderr(predicate::str::contains("keep_previous"));
}

#[test]
fn test_check_with_unreachable_store_reports_no_update() {
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path(), "");

    webui()
        .arg("--config")
        .arg(&config)
        .args(["--server-revision", "r1500", "check"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No update available"));
}

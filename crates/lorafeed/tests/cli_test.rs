//! Integration tests for the `lorafeed` binary.
//!
//! Startup paths only: argument parsing, first-run template creation and
//! the exit codes for each fatal startup failure. No radio daemon or feed
//! service is needed.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `lorafeed` binary with env isolation.
fn lorafeed_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("lorafeed");
    cmd.env("HOME", "/tmp/lorafeed-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/lorafeed-cli-test-nonexistent")
        .env_remove("RUST_LOG")
        .env_remove("LORAFEED_CONFIG")
        .env_remove("LORAFEED_API_KEY")
        .env_remove("LORAFEED_USERNAME")
        .env_remove("LORAFEED_GROUP_NAME")
        .env_remove("LORAFEED_ADDRESS")
        .env_remove("LORAFEED_BASE_URL")
        .env_remove("LORAFEED_RADIO_BIND")
        .env_remove("LORAFEED_RADIO_PEER");
    cmd
}

fn write_config(path: &Path, doc: &serde_json::Value) {
    std::fs::write(path, serde_json::to_string_pretty(doc).unwrap()).unwrap();
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_help_flag() {
    lorafeed_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("LoRa")
            .and(predicate::str::contains("--config"))
            .and(predicate::str::contains("--log-file")),
    );
}

#[test]
fn test_version_flag() {
    lorafeed_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("lorafeed"));
}

#[test]
fn test_unknown_flag_is_usage_error() {
    lorafeed_cmd().arg("--bogus").assert().code(2);
}

// ── Startup failures ────────────────────────────────────────────────

#[test]
fn test_first_run_writes_template_and_exits_not_set_up() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");

    lorafeed_cmd()
        .arg("--config")
        .arg(&path)
        .assert()
        .code(3)
        .stderr(predicate::str::contains("not set up"));

    let template: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(template["sync_word"], json!(18));
    assert!(template["api_key"].is_string());
}

#[test]
fn test_log_file_records_startup_failure() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    let log = dir.path().join("gateway.log");

    lorafeed_cmd()
        .arg("-v")
        .arg("--config")
        .arg(&path)
        .arg("--log-file")
        .arg(&log)
        .assert()
        .code(3);

    let contents = std::fs::read_to_string(&log).unwrap();
    assert!(
        contents.contains("wrote configuration template"),
        "log file was: {contents:?}"
    );
    assert!(contents.contains("fatal error"));
}

#[test]
fn test_config_path_from_env() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("from-env.json");

    lorafeed_cmd()
        .env("LORAFEED_CONFIG", &path)
        .assert()
        .code(3);
    assert!(path.exists());
}

#[test]
fn test_unedited_template_is_invalid_config() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");

    lorafeed_cmd().arg("--config").arg(&path).assert().code(3);
    lorafeed_cmd()
        .arg("--config")
        .arg(&path)
        .assert()
        .code(4)
        .stderr(predicate::str::contains("api_key"));
}

#[test]
fn test_missing_credential_is_invalid_config() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    write_config(
        &path,
        &json!({ "api_key": "aio_key", "username": "maker", "address": "gw01" }),
    );

    lorafeed_cmd()
        .arg("--config")
        .arg(&path)
        .assert()
        .code(4)
        .stderr(predicate::str::contains("group_name"));
}

#[test]
fn test_unbindable_radio_socket_is_radio_failure() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    // TEST-NET-1 is never assigned to a local interface.
    write_config(
        &path,
        &json!({
            "api_key": "aio_key",
            "username": "maker",
            "group_name": "garden",
            "address": "gw01",
            "radio_bind": "192.0.2.1:5700"
        }),
    );

    lorafeed_cmd()
        .arg("--config")
        .arg(&path)
        .assert()
        .code(7)
        .stderr(predicate::str::contains("Radio failure"));
}

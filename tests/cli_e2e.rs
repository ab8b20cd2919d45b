//! End-to-end CLI tests for the hauler binary.

// `Command::cargo_bin` is deprecated in assert_cmd >=2.0.17 in favor of
// `cargo::cargo_bin_cmd!` macro. Suppressed until migration to the new API.
#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Test that --help displays usage information and exits with code 0.
#[test]
fn test_binary_help_displays_usage() {
    let mut cmd = Command::cargo_bin("hauler").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Download a file without blocking"));
}

/// Test that --version displays version and exits with code 0.
#[test]
fn test_binary_version_displays_version() {
    let mut cmd = Command::cargo_bin("hauler").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("hauler"));
}

/// Test that invoking without a URL fails with usage output.
#[test]
fn test_binary_missing_url_returns_error() {
    let mut cmd = Command::cargo_bin("hauler").unwrap();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

/// Test that invalid flags cause non-zero exit.
#[test]
fn test_binary_invalid_flag_returns_error() {
    let mut cmd = Command::cargo_bin("hauler").unwrap();
    cmd.arg("--invalid-flag")
        .arg("https://example.com/file.bin")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

/// Test that an unparseable URL fails fast with the structured error.
#[test]
fn test_binary_invalid_url_fails_fast() {
    let mut cmd = Command::cargo_bin("hauler").unwrap();
    cmd.arg("not a url")
        .arg("--quiet")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid URL"));
}

/// Full download through the binary: file lands byte-identical.
#[tokio::test(flavor = "multi_thread")]
async fn test_binary_downloads_file_to_output_path() {
    let content: Vec<u8> = (0..10_000u32).map(|i| (i % 199) as u8).collect();
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/runtime.tar.xz"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(content.clone()))
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let dest = temp_dir.path().join("runtime.tar.xz");
    let url = format!("{}/runtime.tar.xz", mock_server.uri());

    let mut cmd = Command::cargo_bin("hauler").unwrap();
    cmd.arg(&url)
        .arg("--output")
        .arg(&dest)
        .arg("--quiet")
        .arg("--interval")
        .arg("50")
        .assert()
        .success();

    assert_eq!(std::fs::read(&dest).unwrap(), content);
}

/// --json mode emits machine-readable snapshots on stdout.
#[tokio::test(flavor = "multi_thread")]
async fn test_binary_json_mode_emits_snapshots() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/artifact.bin"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![7u8; 5000]))
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let dest = temp_dir.path().join("artifact.bin");
    let url = format!("{}/artifact.bin", mock_server.uri());

    let mut cmd = Command::cargo_bin("hauler").unwrap();
    cmd.arg(&url)
        .arg("--output")
        .arg(&dest)
        .arg("--json")
        .arg("--quiet")
        .arg("--interval")
        .arg("50")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"downloaded_bytes\""))
        .stdout(predicate::str::contains("\"time_left\""));
}

/// An HTTP error status surfaces on stderr and exits non-zero.
#[tokio::test(flavor = "multi_thread")]
async fn test_binary_http_error_exits_nonzero() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone.bin"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let dest = temp_dir.path().join("gone.bin");
    let url = format!("{}/gone.bin", mock_server.uri());

    let mut cmd = Command::cargo_bin("hauler").unwrap();
    cmd.arg(&url)
        .arg("--output")
        .arg(&dest)
        .arg("--quiet")
        .assert()
        .failure()
        .stderr(predicate::str::contains("HTTP 404"));
}

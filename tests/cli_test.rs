//! Binary-level checks for argument parsing and configuration errors.

mod common;

use assert_cmd::Command;
use predicates::prelude::*;

fn queuechat() -> Command {
    let mut cmd = Command::cargo_bin("queuechat").expect("binary should build");
    cmd.env_remove("QUEUECHAT_API_URL")
        .env_remove("QUEUECHAT_SESSION_TOKEN")
        .env_remove("QUEUECHAT_POLL_INTERVAL_SECONDS")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_lists_commands() {
    queuechat()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("send"))
        .stdout(predicate::str::contains("watch"))
        .stdout(predicate::str::contains("confirm-email"));
}

#[test]
fn test_non_numeric_chat_id_is_rejected() {
    queuechat()
        .args(["show", "abc"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid"));
}

#[test]
fn test_invalid_poll_interval_in_config_fails() {
    let (_dir, path) = common::temp_config_file("polling:\n  interval_secs: 0\n");
    queuechat()
        .arg("--config")
        .arg(&path)
        .arg("chats")
        .assert()
        .failure()
        .stderr(predicate::str::contains("interval_secs"));
}

#[test]
fn test_non_http_api_url_fails() {
    queuechat()
        .args(["--api-url", "ftp://example.com", "me"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("http or https"));
}

#[test]
fn test_bad_pin_fails_before_any_request() {
    queuechat()
        .args(["--api-url", "http://127.0.0.1:9", "confirm-email", "12ab"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("6 digits"));
}

//! End-to-end tests for the `zalo-bot` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn zalo_bot() -> Command {
    let mut cmd = Command::cargo_bin("zalo-bot").unwrap();
    cmd.env_remove("ZALO_BOT_TOKEN")
        .env_remove("ZALO_API_URL")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_lists_commands() {
    zalo_bot()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("send-message"))
        .stdout(predicate::str::contains("batch"))
        .stdout(predicate::str::contains("webhook"));
}

#[test]
fn test_missing_token_exits_with_usage_code() {
    zalo_bot()
        .arg("get-me")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Bot token is required"));
}

#[test]
fn test_invalid_format_is_rejected() {
    zalo_bot()
        .args(["--token", "T", "--format", "xml", "get-me"])
        .assert()
        .failure();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_get_me_prints_bot_info() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/botTOKEN/getMe"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "result": {"id": 42, "is_bot": true, "username": "order_bot"}
        })))
        .mount(&server)
        .await;
    let uri = server.uri();

    tokio::task::spawn_blocking(move || {
        zalo_bot()
            .args(["--token", "TOKEN", "--api-url", uri.as_str(), "get-me"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"id\": \"42\""))
            .stdout(predicate::str::contains("order_bot"));
    })
    .await
    .unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rejected_credentials_exit_code() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/botBAD/getMe"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": false,
            "error_code": 401,
            "description": "Unauthorized"
        })))
        .mount(&server)
        .await;
    let uri = server.uri();

    tokio::task::spawn_blocking(move || {
        zalo_bot()
            .args(["--token", "BAD", "--api-url", uri.as_str(), "test-credentials"])
            .assert()
            .code(5)
            .stderr(predicate::str::contains("Unauthorized"));
    })
    .await
    .unwrap();
}

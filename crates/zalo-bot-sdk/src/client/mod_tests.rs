//! Tests for the Zalo Bot API client.

use super::*;
use async_trait::async_trait;
use bytes::Bytes;
use serde_json::json;
use wiremock::matchers::{body_json, body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct NoopSleeper;

#[async_trait]
impl Sleeper for NoopSleeper {
    async fn sleep(&self, _duration: Duration) {}
}

fn client_for(server: &MockServer) -> ZaloBotClient {
    ZaloBotClient::builder("TOKEN")
        .config(ClientConfig::default().with_api_base_url(server.uri()))
        .sleeper(Arc::new(NoopSleeper))
        .build()
        .expect("client builds")
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_client_config_defaults() {
    let config = ClientConfig::default();

    assert_eq!(config.api_base_url, "https://bot-api.zaloplatforms.com");
    assert_eq!(config.timeout, Duration::from_secs(30));
    assert_eq!(config.retry_policy.max_attempts, 3);
}

#[test]
fn test_client_config_builder() {
    let config = ClientConfig::builder()
        .api_base_url("http://localhost:9000")
        .timeout(Duration::from_secs(5))
        .retry_policy(RetryPolicy::no_retry())
        .user_agent("test-agent")
        .build();

    assert_eq!(config.api_base_url, "http://localhost:9000");
    assert_eq!(config.timeout, Duration::from_secs(5));
    assert_eq!(config.retry_policy.max_attempts, 1);
    assert_eq!(config.user_agent, "test-agent");
}

#[test]
fn test_method_url_embeds_token() {
    let client = ZaloBotClient::builder("123:abc")
        .config(ClientConfig::default().with_api_base_url("https://api.example.com/"))
        .build()
        .unwrap();

    assert_eq!(
        client.method_url("sendMessage"),
        "https://api.example.com/bot123:abc/sendMessage"
    );
}

#[test]
fn test_debug_output_redacts_token() {
    let client = ZaloBotClient::builder("very-secret-token").build().unwrap();

    let debug = format!("{:?}", client);

    assert!(!debug.contains("very-secret-token"));
    assert!(debug.contains("REDACTED"));
}

// ============================================================================
// Operations
// ============================================================================

#[tokio::test]
async fn test_send_message_returns_result() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/botTOKEN/sendMessage"))
        .and(body_json(json!({"chat_id": "123", "text": "hi"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "result": {"message_id": 1, "date": 1700000000}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);

    let result = client.send_message("123", "hi").await.expect("sent");

    assert_eq!(result, json!({"message_id": 1, "date": 1700000000}));
}

#[tokio::test]
async fn test_api_failure_surfaces_description() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/botTOKEN/sendSticker"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": false,
            "error_code": 404,
            "description": "sticker not found"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);

    let err = client.send_sticker("123", "s1").await.expect_err("api failure");

    assert!(matches!(err, ClientError::Api(_)));
    assert_eq!(err.to_string(), "sticker not found");
}

#[tokio::test]
async fn test_get_me_decodes_bot_info() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/botTOKEN/getMe"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "result": {"id": "9001", "account_name": "bot.demo", "is_bot": true}
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);

    let info = client.get_me().await.expect("decoded");

    assert_eq!(info.id, "9001");
    assert!(info.is_bot);
}

#[tokio::test]
async fn test_get_webhook_info_decodes_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/botTOKEN/getWebhookInfo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "result": {"url": "https://hooks.example.com/a/webhook", "updated_at": 5}
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);

    let info = client.get_webhook_info().await.expect("decoded");

    assert_eq!(info.url.as_deref(), Some("https://hooks.example.com/a/webhook"));
}

#[tokio::test]
async fn test_set_webhook_sends_url_and_secret() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/botTOKEN/setWebhook"))
        .and(body_json(json!({
            "url": "https://hooks.example.com/a/webhook",
            "secret_token": "abc123"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true, "result": true})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);

    let result = client
        .set_webhook("https://hooks.example.com/a/webhook", "abc123")
        .await
        .expect("registered");

    assert_eq!(result, json!(true));
}

#[tokio::test]
async fn test_photo_upload_uses_multipart() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/botTOKEN/sendPhoto"))
        .and(body_string_contains("filename=\"photo.jpg\""))
        .and(body_string_contains("Content-Type: image/jpeg"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true, "result": {"message_id": 3}})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let attachment = BinaryAttachment::new(Bytes::from_static(b"jpeg bytes"));

    let result = client
        .send_photo_upload("123", attachment, None)
        .await
        .expect("uploaded");

    assert_eq!(result, json!({"message_id": 3}));
}

#[tokio::test]
async fn test_operation_calls_retry_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/botTOKEN/deleteWebhook"))
        .respond_with(ResponseTemplate::new(502))
        .expect(3)
        .mount(&server)
        .await;

    let client = client_for(&server);

    let err = client.delete_webhook().await.expect_err("server error");

    assert!(matches!(err, ClientError::Request(RequestError::Http { status: 502, .. })));
}

#[tokio::test]
async fn test_single_attempt_calls_do_not_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);

    let result = client
        .execute_operation_once(&OutboundOperation::GetWebhookInfo)
        .await;

    assert!(result.is_err());
}

// ============================================================================
// Credential test
// ============================================================================

#[tokio::test]
async fn test_credentials_require_token() {
    let client = ZaloBotClient::builder("").build().unwrap();

    let result = client.test_credentials().await;

    assert_eq!(result.status, CredentialStatus::Error);
    assert_eq!(result.message, "Bot Token is required");
}

#[tokio::test]
async fn test_credentials_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/botTOKEN/getMe"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true, "result": {"id": "1"}})))
        .expect(1)
        .mount(&server)
        .await;

    let result = client_for(&server).test_credentials().await;

    assert!(result.is_ok());
    assert_eq!(result.message, "Authentication successful");
}

#[tokio::test]
async fn test_credentials_rejected_by_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": false})))
        .mount(&server)
        .await;

    let result = client_for(&server).test_credentials().await;

    assert_eq!(result.status, CredentialStatus::Error);
    assert_eq!(result.message, "Authentication failed");
}

#[tokio::test]
async fn test_credentials_transport_failure_reports_error_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "ok": false,
            "description": "Unauthorized"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = client_for(&server).test_credentials().await;

    assert_eq!(result.status, CredentialStatus::Error);
    assert!(result.message.contains("Unauthorized"));
}

#[test]
fn test_credential_status_serializes_like_host_contract() {
    assert_eq!(serde_json::to_value(CredentialStatus::Ok).unwrap(), json!("OK"));
    assert_eq!(serde_json::to_value(CredentialStatus::Error).unwrap(), json!("Error"));
}

//! Tests for the operation dispatcher.

use super::*;
use crate::client::{ClientConfig, RetryPolicy};
use crate::error::{ApiOperationError, RequestError, UnsupportedOperationError};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn dispatcher_for(server: &MockServer) -> OperationDispatcher {
    let client = ZaloBotClient::builder("TOKEN")
        .config(
            ClientConfig::default()
                .with_api_base_url(server.uri())
                .with_retry_policy(RetryPolicy::no_retry()),
        )
        .build()
        .expect("client builds");
    OperationDispatcher::new(client)
}

fn message_item(chat_id: &str, text: &str) -> ItemParameters {
    ItemParameters::from_json(json!({"chatId": chat_id, "text": text}))
}

async fn mount_send_message(server: &MockServer, chat_id: &str, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/botTOKEN/sendMessage"))
        .and(body_partial_json(json!({"chat_id": chat_id})))
        .respond_with(response)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_single_item_outputs_result_paired_with_index() {
    let server = MockServer::start().await;
    mount_send_message(
        &server,
        "123",
        ResponseTemplate::new(200)
            .set_body_json(json!({"ok": true, "result": {"message_id": 1, "date": 1}})),
    )
    .await;

    let records = dispatcher_for(&server)
        .execute_batch(
            "message",
            "sendMessage",
            &[message_item("123", "hi")],
            BatchOptions::default(),
        )
        .await
        .expect("batch succeeds");

    assert_eq!(
        records,
        vec![OutputRecord {
            json: json!({"message_id": 1, "date": 1}),
            paired_item: 0,
        }]
    );
}

/// With continue-on-failure, a failing middle item becomes an error record
/// and its neighbours keep their normal results.
#[tokio::test]
async fn test_continue_on_failure_isolates_item() {
    let server = MockServer::start().await;
    mount_send_message(
        &server,
        "1",
        ResponseTemplate::new(200).set_body_json(json!({"ok": true, "result": {"message_id": 10}})),
    )
    .await;
    mount_send_message(
        &server,
        "2",
        ResponseTemplate::new(400)
            .set_body_json(json!({"ok": false, "error_code": 400, "description": "chat not found"})),
    )
    .await;
    mount_send_message(
        &server,
        "3",
        ResponseTemplate::new(200).set_body_json(json!({"ok": true, "result": {"message_id": 30}})),
    )
    .await;

    let items = vec![
        message_item("1", "a"),
        message_item("2", "b"),
        message_item("3", "c"),
    ];

    let records = dispatcher_for(&server)
        .execute_batch(
            "message",
            "sendMessage",
            &items,
            BatchOptions {
                continue_on_failure: true,
            },
        )
        .await
        .expect("batch completes");

    assert_eq!(records.len(), 3);
    assert_eq!(records[0].json, json!({"message_id": 10}));
    assert!(records[1].is_error());
    assert!(records[1].json["error"]
        .as_str()
        .unwrap()
        .contains("chat not found"));
    assert_eq!(records[2].json, json!({"message_id": 30}));
    assert_eq!(
        records.iter().map(|r| r.paired_item).collect::<Vec<_>>(),
        vec![0, 1, 2]
    );
}

#[tokio::test]
async fn test_first_failure_aborts_batch() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/botTOKEN/sendMessage"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": false})))
        .expect(1)
        .mount(&server)
        .await;

    let items = vec![message_item("1", "a"), message_item("2", "b")];

    let err = dispatcher_for(&server)
        .execute_batch("message", "sendMessage", &items, BatchOptions::default())
        .await
        .expect_err("batch aborts");

    assert_eq!(err.item_index, 0);
    assert!(matches!(
        err.source,
        ClientError::Api(ApiOperationError { ref description, .. }) if description == "API request failed"
    ));
}

#[tokio::test]
async fn test_unknown_operation_is_a_per_item_error() {
    let server = MockServer::start().await;

    let records = dispatcher_for(&server)
        .execute_batch(
            "message",
            "sendVideo",
            &[ItemParameters::new()],
            BatchOptions {
                continue_on_failure: true,
            },
        )
        .await
        .expect("batch completes");

    assert_eq!(records[0].json, json!({"error": "Unknown operation: sendVideo"}));
}

#[tokio::test]
async fn test_unknown_resource_aborts_without_continue() {
    let server = MockServer::start().await;

    let err = dispatcher_for(&server)
        .execute_batch(
            "channel",
            "getMe",
            &[ItemParameters::new()],
            BatchOptions::default(),
        )
        .await
        .expect_err("unknown resource");

    assert!(matches!(
        err.source,
        ClientError::Unsupported(UnsupportedOperationError::Resource { ref name }) if name == "channel"
    ));
}

#[tokio::test]
async fn test_missing_parameter_fails_item_before_any_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let records = dispatcher_for(&server)
        .execute_batch(
            "message",
            "sendSticker",
            &[ItemParameters::from_json(json!({"chatId": "1"}))],
            BatchOptions {
                continue_on_failure: true,
            },
        )
        .await
        .expect("batch completes");

    assert_eq!(
        records[0].json,
        json!({"error": "Missing required parameter: stickerId"})
    );
}

#[tokio::test]
async fn test_success_without_result_outputs_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/botTOKEN/deleteWebhook"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&server)
        .await;

    let records = dispatcher_for(&server)
        .execute_batch(
            "webhook",
            "deleteWebhook",
            &[ItemParameters::new()],
            BatchOptions::default(),
        )
        .await
        .expect("batch succeeds");

    assert_eq!(records[0].json, json!({"ok": true}));
}

#[tokio::test]
async fn test_execute_item_surfaces_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/botTOKEN/getMe"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .expect(1)
        .mount(&server)
        .await;

    let dispatcher = dispatcher_for(&server);

    let err = dispatcher
        .execute_item("bot", "getMe", &ItemParameters::new())
        .await
        .expect_err("server error");

    assert!(matches!(
        err,
        ClientError::Request(RequestError::Http { status: 503, .. })
    ));
}

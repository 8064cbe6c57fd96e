//! Tests for the response envelope.

use super::*;
use serde_json::json;

fn parse(value: Value) -> ApiResponse {
    serde_json::from_value(value).expect("valid envelope")
}

#[test]
fn test_success_outputs_result() {
    let envelope = parse(json!({"ok": true, "result": {"message_id": 1, "date": 1700000000}}));

    let output = envelope.into_output().expect("success");

    assert_eq!(output, json!({"message_id": 1, "date": 1700000000}));
}

/// A success envelope without `result` yields the full envelope.
#[test]
fn test_success_without_result_outputs_envelope() {
    let envelope = parse(json!({"ok": true, "description": "Webhook was deleted"}));

    let output = envelope.into_output().expect("success");

    assert_eq!(output, json!({"ok": true, "description": "Webhook was deleted"}));
}

#[test]
fn test_success_without_result_keeps_unrecognized_fields() {
    let envelope = parse(json!({"ok": true, "message": "done", "request_id": "r-1"}));

    assert_eq!(envelope.extra.get("request_id"), Some(&json!("r-1")));
    let output = envelope.into_output().expect("success");

    assert_eq!(
        output,
        json!({"ok": true, "message": "done", "request_id": "r-1"})
    );
}

#[test]
fn test_failure_uses_description() {
    let envelope = parse(json!({"ok": false, "error_code": 400, "description": "chat not found"}));

    let err = envelope.into_output().expect_err("failure");

    assert_eq!(err.error_code, Some(400));
    assert_eq!(err.to_string(), "chat not found");
}

#[test]
fn test_failure_without_description_uses_generic_message() {
    let envelope = parse(json!({"ok": false}));

    let err = envelope.into_output().expect_err("failure");

    assert_eq!(err.to_string(), "API request failed");
}

#[test]
fn test_into_outcome_is_tagged() {
    let success = parse(json!({"ok": true, "result": 5}));
    assert_eq!(
        success.into_outcome(),
        ApiOutcome::Success {
            result: Some(json!(5))
        }
    );

    let failure = parse(json!({"ok": false, "error_code": 401, "description": "Unauthorized"}));
    assert_eq!(
        failure.into_outcome(),
        ApiOutcome::Failure {
            error_code: Some(401),
            description: Some("Unauthorized".to_string()),
        }
    );
}

#[test]
fn test_decode_typed_result() {
    #[derive(Debug, Deserialize, PartialEq)]
    struct Sample {
        id: u32,
    }

    let envelope = parse(json!({"ok": true, "result": {"id": 7}}));

    let decoded: Sample = envelope.decode().expect("decodes");

    assert_eq!(decoded, Sample { id: 7 });
}

#[test]
fn test_decode_failure_is_api_error() {
    let envelope = parse(json!({"ok": false, "description": "Unauthorized"}));

    let err = envelope.decode::<Value>().expect_err("api failure");

    assert!(matches!(err, ClientError::Api(_)));
}

use super::*;
use serde_json::json;

#[test]
fn test_bot_info_accepts_numeric_and_string_ids() {
    let numeric: BotInfo =
        serde_json::from_value(json!({"id": 42, "is_bot": true, "first_name": "Helper"})).unwrap();
    assert_eq!(numeric.id, "42");
    assert_eq!(numeric.first_name.as_deref(), Some("Helper"));

    let text: BotInfo = serde_json::from_value(json!({"id": "abc", "account_name": "bot.helper"})).unwrap();
    assert_eq!(text.id, "abc");
    assert_eq!(text.extra.get("account_name"), Some(&json!("bot.helper")));
}

#[test]
fn test_webhook_info_tolerates_missing_url() {
    let info: WebhookInfo = serde_json::from_value(json!({})).unwrap();
    assert_eq!(info.url, None);

    let info: WebhookInfo =
        serde_json::from_value(json!({"url": "https://example.com/hook", "updated_at": 1})).unwrap();
    assert_eq!(info.url.as_deref(), Some("https://example.com/hook"));
    assert_eq!(info.updated_at, Some(1));
}

#[test]
fn test_send_photo_omits_absent_caption() {
    let request = SendPhotoRequest {
        chat_id: "1".to_string(),
        photo: "https://example.com/a.jpg".to_string(),
        caption: None,
    };

    assert_eq!(
        serde_json::to_value(&request).unwrap(),
        json!({"chat_id": "1", "photo": "https://example.com/a.jpg"})
    );
}

#[test]
fn test_chat_action_parses_every_wire_name() {
    for action in ChatAction::ALL {
        assert_eq!(action.as_str().parse::<ChatAction>().unwrap(), action);
        assert_eq!(serde_json::to_value(action).unwrap(), json!(action.as_str()));
    }
}

#[test]
fn test_unknown_chat_action_is_invalid_value() {
    let err = "dancing".parse::<ChatAction>().unwrap_err();
    assert!(matches!(err, ParameterError::InvalidValue { ref name, .. } if name == "action"));
}

#[test]
fn test_set_webhook_debug_redacts_secret() {
    let request = SetWebhookRequest {
        url: "https://example.com/hook".to_string(),
        secret_token: "s3cr3t-value".to_string(),
    };

    let debug = format!("{:?}", request);

    assert!(!debug.contains("s3cr3t-value"));
    assert!(debug.contains("REDACTED"));
}

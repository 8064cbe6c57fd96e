//! Tests for operation resolution and request encoding.

use super::*;
use crate::error::ParameterError;
use serde_json::json;

fn resolve(resource: &str, operation: &str, params: serde_json::Value) -> Result<OutboundOperation, ClientError> {
    OutboundOperation::from_parameters(resource, operation, &ItemParameters::from_json(params))
}

mod resolution {
    use super::*;

    #[test]
    fn test_every_listed_operation_resolves() {
        let params = json!({
            "chatId": "1",
            "text": "t",
            "photo": "https://example.com/p.jpg",
            "stickerId": "s",
            "webhookUrl": "https://example.com/hook",
            "secretToken": "abc"
        });

        let operations = [
            ("message", "sendMessage"),
            ("message", "sendPhoto"),
            ("message", "sendSticker"),
            ("message", "sendChatAction"),
            ("bot", "getMe"),
            ("webhook", "getWebhookInfo"),
            ("webhook", "setWebhook"),
            ("webhook", "deleteWebhook"),
        ];

        for (resource, operation) in operations {
            let resolved = resolve(resource, operation, params.clone())
                .unwrap_or_else(|e| panic!("{resource}/{operation}: {e}"));
            assert_eq!(resolved.method_name(), operation);
        }
    }

    #[test]
    fn test_operation_from_other_resource_is_unknown() {
        let err = resolve("bot", "sendMessage", json!({})).unwrap_err();

        assert_eq!(err.to_string(), "Unknown operation: sendMessage");
    }

    #[test]
    fn test_chat_action_defaults_to_typing() {
        let op = resolve("message", "sendChatAction", json!({"chatId": "1"})).unwrap();

        assert_eq!(
            op,
            OutboundOperation::SendChatAction {
                chat_id: "1".to_string(),
                action: ChatAction::Typing,
            }
        );
    }

    #[test]
    fn test_unknown_chat_action_is_rejected() {
        let err = resolve(
            "message",
            "sendChatAction",
            json!({"chatId": "1", "action": "juggling"}),
        )
        .unwrap_err();

        assert!(matches!(
            err,
            ClientError::Parameter(ParameterError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_photo_by_reference_requires_photo() {
        let err = resolve("message", "sendPhoto", json!({"chatId": "1"})).unwrap_err();

        assert_eq!(err.to_string(), "Missing required parameter: photo");
    }

    #[test]
    fn test_photo_upload_reads_named_property() {
        let params = ItemParameters::from_json(json!({
            "chatId": "1",
            "binaryData": true,
            "binaryPropertyName": "image",
            "caption": "hello"
        }))
        .with_binary(
            "image",
            BinaryAttachment::new(Bytes::from_static(b"png")).with_file_name("a.png"),
        );

        let op = OutboundOperation::from_parameters("message", "sendPhoto", &params).unwrap();

        match op {
            OutboundOperation::SendPhoto {
                source: PhotoSource::Upload(attachment),
                caption,
                ..
            } => {
                assert_eq!(attachment.upload_file_name(), "a.png");
                assert_eq!(caption.as_deref(), Some("hello"));
            }
            other => panic!("unexpected operation: {other:?}"),
        }
    }

    #[test]
    fn test_photo_upload_without_attachment_fails() {
        let err = resolve(
            "message",
            "sendPhoto",
            json!({"chatId": "1", "binaryData": true}),
        )
        .unwrap_err();

        assert_eq!(err.to_string(), "No binary data found for property 'data'");
    }
}

mod encoding {
    use super::*;

    #[test]
    fn test_get_methods_have_no_body() {
        assert_eq!(OutboundOperation::GetMe.http_method(), HttpMethod::Get);
        assert_eq!(OutboundOperation::GetWebhookInfo.http_method(), HttpMethod::Get);
        assert!(OutboundOperation::GetMe.request_body().unwrap().is_none());
        assert_eq!(OutboundOperation::DeleteWebhook.http_method(), HttpMethod::Post);
        assert!(OutboundOperation::DeleteWebhook.request_body().unwrap().is_none());
    }

    #[test]
    fn test_json_bodies_use_remote_field_names() {
        let cases = [
            (
                OutboundOperation::SendMessage {
                    chat_id: "1".to_string(),
                    text: "hi".to_string(),
                },
                json!({"chat_id": "1", "text": "hi"}),
            ),
            (
                OutboundOperation::SendSticker {
                    chat_id: "1".to_string(),
                    sticker_id: "s".to_string(),
                },
                json!({"chat_id": "1", "sticker_id": "s"}),
            ),
            (
                OutboundOperation::SendChatAction {
                    chat_id: "1".to_string(),
                    action: ChatAction::UploadPhoto,
                },
                json!({"chat_id": "1", "action": "upload_photo"}),
            ),
            (
                OutboundOperation::SetWebhook {
                    url: "https://example.com/hook".to_string(),
                    secret_token: "abc".to_string(),
                },
                json!({"url": "https://example.com/hook", "secret_token": "abc"}),
            ),
        ];

        for (op, expected) in cases {
            assert_eq!(
                op.request_body().unwrap(),
                Some(RequestBody::Json(expected)),
                "{}",
                op.method_name()
            );
        }
    }

    #[test]
    fn test_photo_reference_omits_empty_caption() {
        let op = OutboundOperation::SendPhoto {
            chat_id: "1".to_string(),
            source: PhotoSource::Reference("file-id".to_string()),
            caption: Some(String::new()),
        };

        assert_eq!(
            op.request_body().unwrap(),
            Some(RequestBody::Json(json!({"chat_id": "1", "photo": "file-id"})))
        );
    }

    #[test]
    fn test_photo_upload_falls_back_to_default_file_metadata() {
        let op = OutboundOperation::SendPhoto {
            chat_id: "1".to_string(),
            source: PhotoSource::Upload(BinaryAttachment::new(Bytes::from_static(b"raw"))),
            caption: Some("caption".to_string()),
        };

        let Some(RequestBody::Multipart(body)) = op.request_body().unwrap() else {
            panic!("expected multipart body");
        };

        assert_eq!(
            body.fields,
            vec![
                ("chat_id".to_string(), "1".to_string()),
                ("caption".to_string(), "caption".to_string()),
            ]
        );
        assert_eq!(body.file.field_name, "photo");
        assert_eq!(body.file.file_name, "photo.jpg");
        assert_eq!(body.file.content_type, "image/jpeg");
    }

    #[test]
    fn test_set_webhook_debug_redacts_secret() {
        let op = OutboundOperation::SetWebhook {
            url: "https://example.com/hook".to_string(),
            secret_token: "hidden-secret".to_string(),
        };

        assert!(!format!("{op:?}").contains("hidden-secret"));
    }
}

// Request and result models for Zalo Bot API methods

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::ParameterError;

/// Bot account details returned by `getMe`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotInfo {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,

    #[serde(default)]
    pub is_bot: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Fields not modelled above.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Current webhook registration returned by `getWebhookInfo`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebhookInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_update_count: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error_date: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error_message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendMessageRequest {
    pub chat_id: String,
    pub text: String,
}

/// `sendPhoto` by URL or file id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendPhotoRequest {
    pub chat_id: String,
    pub photo: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendStickerRequest {
    pub chat_id: String,
    pub sticker_id: String,
}

/// Presence indicator shown to the chat while the bot works.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatAction {
    #[default]
    Typing,
    UploadPhoto,
    UploadVideo,
    UploadDocument,
    FindLocation,
    RecordVideo,
    RecordAudio,
    UploadAudio,
}

impl ChatAction {
    pub const ALL: [ChatAction; 8] = [
        ChatAction::Typing,
        ChatAction::UploadPhoto,
        ChatAction::UploadVideo,
        ChatAction::UploadDocument,
        ChatAction::FindLocation,
        ChatAction::RecordVideo,
        ChatAction::RecordAudio,
        ChatAction::UploadAudio,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Typing => "typing",
            Self::UploadPhoto => "upload_photo",
            Self::UploadVideo => "upload_video",
            Self::UploadDocument => "upload_document",
            Self::FindLocation => "find_location",
            Self::RecordVideo => "record_video",
            Self::RecordAudio => "record_audio",
            Self::UploadAudio => "upload_audio",
        }
    }
}

impl fmt::Display for ChatAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChatAction {
    type Err = ParameterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| ParameterError::InvalidValue {
                name: "action".to_string(),
                message: format!("unknown chat action '{}'", s),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendChatActionRequest {
    pub chat_id: String,
    pub action: ChatAction,
}

#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct SetWebhookRequest {
    pub url: String,
    pub secret_token: String,
}

impl fmt::Debug for SetWebhookRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetWebhookRequest")
            .field("url", &self.url)
            .field("secret_token", &"<REDACTED>")
            .finish()
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, found {}",
            other
        ))),
    }
}

#[cfg(test)]
#[path = "types_tests.rs"]
mod tests;

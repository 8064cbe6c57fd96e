//! Classification of inbound events into output channels.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const EVENT_TEXT_RECEIVED: &str = "message.text.received";
pub const EVENT_IMAGE_RECEIVED: &str = "message.image.received";
pub const EVENT_STICKER_RECEIVED: &str = "message.sticker.received";
pub const EVENT_UNSUPPORTED_RECEIVED: &str = "message.unsupported.received";

/// The five outputs of the smart endpoint, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputChannel {
    TextMessage,
    PhotoOnly,
    PhotoWithMessage,
    Sticker,
    Unsupported,
}

impl OutputChannel {
    pub const ALL: [OutputChannel; 5] = [
        OutputChannel::TextMessage,
        OutputChannel::PhotoOnly,
        OutputChannel::PhotoWithMessage,
        OutputChannel::Sticker,
        OutputChannel::Unsupported,
    ];

    /// Zero-based output index.
    pub fn index(&self) -> usize {
        match self {
            Self::TextMessage => 0,
            Self::PhotoOnly => 1,
            Self::PhotoWithMessage => 2,
            Self::Sticker => 3,
            Self::Unsupported => 4,
        }
    }

    /// Display name of the output.
    pub fn name(&self) -> &'static str {
        match self {
            Self::TextMessage => "Text Message",
            Self::PhotoOnly => "Photo Only",
            Self::PhotoWithMessage => "Photo + Message",
            Self::Sticker => "Sticker",
            Self::Unsupported => "Unsupported/Other",
        }
    }

    /// Machine-readable key, as used in configuration.
    pub fn key(&self) -> &'static str {
        match self {
            Self::TextMessage => "text_message",
            Self::PhotoOnly => "photo_only",
            Self::PhotoWithMessage => "photo_with_message",
            Self::Sticker => "sticker",
            Self::Unsupported => "unsupported",
        }
    }
}

impl fmt::Display for OutputChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The two inbound endpoint identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookEndpoint {
    /// Legacy single-output delivery.
    Default,

    /// Five-output classified delivery.
    Smart,
}

impl WebhookEndpoint {
    /// Last path segment of the callback URL.
    pub fn path_suffix(&self) -> &'static str {
        match self {
            Self::Default => "webhook",
            Self::Smart => "webhook-smart",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Smart => "smart",
        }
    }

    pub fn is_smart(&self) -> bool {
        matches!(self, Self::Smart)
    }
}

impl fmt::Display for WebhookEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WebhookEndpoint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "default" => Ok(Self::Default),
            "smart" => Ok(Self::Smart),
            other => Err(format!("unknown webhook endpoint '{}'", other)),
        }
    }
}

/// Assign an inbound event to exactly one smart-endpoint channel.
///
/// Image events go to [`OutputChannel::PhotoWithMessage`] only when
/// `message.caption` is a string with non-whitespace content.
pub fn classify(payload: &Value) -> OutputChannel {
    let event_name = payload.get("event_name").and_then(Value::as_str);

    match event_name {
        Some(EVENT_TEXT_RECEIVED) => OutputChannel::TextMessage,
        Some(EVENT_IMAGE_RECEIVED) if has_caption(payload) => OutputChannel::PhotoWithMessage,
        Some(EVENT_IMAGE_RECEIVED) => OutputChannel::PhotoOnly,
        Some(EVENT_STICKER_RECEIVED) => OutputChannel::Sticker,
        _ => OutputChannel::Unsupported,
    }
}

fn has_caption(payload: &Value) -> bool {
    payload
        .pointer("/message/caption")
        .and_then(Value::as_str)
        .map(|caption| !caption.trim().is_empty())
        .unwrap_or(false)
}

/// Routing result for one inbound invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookOutput {
    pub endpoint: WebhookEndpoint,

    /// Selected channel; `None` on the default endpoint's single output.
    pub channel: Option<OutputChannel>,

    pub payload: Value,
}

impl WebhookOutput {
    /// Per-output delivery lists.
    ///
    /// The default endpoint has one output holding the payload. The smart
    /// endpoint has five, of which exactly one holds the payload.
    pub fn into_channels(self) -> Vec<Vec<Value>> {
        match self.channel {
            None => vec![vec![self.payload]],
            Some(channel) => {
                let mut outputs = vec![Vec::new(); OutputChannel::ALL.len()];
                outputs[channel.index()].push(self.payload);
                outputs
            }
        }
    }
}

/// Route a parsed payload for the given endpoint.
///
/// The default endpoint passes the payload through unchanged.
pub fn route(payload: Value, endpoint: WebhookEndpoint) -> WebhookOutput {
    let channel = endpoint.is_smart().then(|| classify(&payload));

    WebhookOutput {
        endpoint,
        channel,
        payload,
    }
}

#[cfg(test)]
#[path = "classifier_tests.rs"]
mod tests;

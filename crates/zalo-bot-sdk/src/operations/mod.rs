//! Outbound bot operations and the batch dispatcher.
//!
//! An [`OutboundOperation`] is resolved from a resource name, an operation
//! name and one item's parameters, then handed to the client. The
//! [`OperationDispatcher`] does this for every item of a batch.

mod dispatcher;
mod parameters;

use std::fmt;
use std::str::FromStr;

use bytes::Bytes;

use crate::client::{
    ChatAction, FilePart, HttpMethod, MultipartBody, RequestBody, SendChatActionRequest,
    SendMessageRequest, SendPhotoRequest, SendStickerRequest, SetWebhookRequest,
};
use crate::error::{ClientError, RequestError, UnsupportedOperationError};

pub use dispatcher::{BatchOptions, OperationDispatcher, OutputRecord};
pub use parameters::ItemParameters;

/// File name used when an attachment carries none.
pub const DEFAULT_PHOTO_FILE_NAME: &str = "photo.jpg";

/// Content type used when an attachment carries none.
pub const DEFAULT_PHOTO_CONTENT_TYPE: &str = "image/jpeg";

/// Property holding the photo upload when the item does not name one.
pub const DEFAULT_BINARY_PROPERTY: &str = "data";

/// API resource grouping operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Message,
    Bot,
    Webhook,
}

impl Resource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Message => "message",
            Self::Bot => "bot",
            Self::Webhook => "webhook",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resource {
    type Err = UnsupportedOperationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "message" => Ok(Self::Message),
            "bot" => Ok(Self::Bot),
            "webhook" => Ok(Self::Webhook),
            other => Err(UnsupportedOperationError::Resource {
                name: other.to_string(),
            }),
        }
    }
}

/// Binary payload attached to an input item.
#[derive(Clone, PartialEq, Eq)]
pub struct BinaryAttachment {
    pub data: Bytes,
    pub file_name: Option<String>,
    pub mime_type: Option<String>,
}

impl BinaryAttachment {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            file_name: None,
            mime_type: None,
        }
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// File name for upload, falling back to `photo.jpg`.
    pub fn upload_file_name(&self) -> &str {
        self.file_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(DEFAULT_PHOTO_FILE_NAME)
    }

    /// Content type for upload, falling back to `image/jpeg`.
    pub fn upload_content_type(&self) -> &str {
        self.mime_type
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_PHOTO_CONTENT_TYPE)
    }
}

impl fmt::Debug for BinaryAttachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BinaryAttachment")
            .field("len", &self.data.len())
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .finish()
    }
}

/// Where a photo comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum PhotoSource {
    /// URL or file id, sent as a JSON field.
    Reference(String),

    /// Binary upload, sent as multipart.
    Upload(BinaryAttachment),
}

/// One outbound bot API call with its parameters.
#[derive(Clone, PartialEq)]
pub enum OutboundOperation {
    SendMessage {
        chat_id: String,
        text: String,
    },
    SendPhoto {
        chat_id: String,
        source: PhotoSource,
        caption: Option<String>,
    },
    SendSticker {
        chat_id: String,
        sticker_id: String,
    },
    SendChatAction {
        chat_id: String,
        action: ChatAction,
    },
    GetMe,
    GetWebhookInfo,
    SetWebhook {
        url: String,
        secret_token: String,
    },
    DeleteWebhook,
}

impl fmt::Debug for OutboundOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SetWebhook { url, .. } => f
                .debug_struct("SetWebhook")
                .field("url", url)
                .field("secret_token", &"<REDACTED>")
                .finish(),
            other => f
                .debug_struct(other.method_name())
                .finish_non_exhaustive(),
        }
    }
}

impl OutboundOperation {
    /// Remote API method name.
    pub fn method_name(&self) -> &'static str {
        match self {
            Self::SendMessage { .. } => "sendMessage",
            Self::SendPhoto { .. } => "sendPhoto",
            Self::SendSticker { .. } => "sendSticker",
            Self::SendChatAction { .. } => "sendChatAction",
            Self::GetMe => "getMe",
            Self::GetWebhookInfo => "getWebhookInfo",
            Self::SetWebhook { .. } => "setWebhook",
            Self::DeleteWebhook => "deleteWebhook",
        }
    }

    pub fn http_method(&self) -> HttpMethod {
        match self {
            Self::GetMe | Self::GetWebhookInfo => HttpMethod::Get,
            _ => HttpMethod::Post,
        }
    }

    /// Encoded request body, if the method takes one.
    ///
    /// Captions are only sent when non-empty.
    ///
    /// # Errors
    ///
    /// Returns `RequestError::InvalidRequest` if a body cannot be serialized.
    pub fn request_body(&self) -> Result<Option<RequestBody>, RequestError> {
        let body = match self {
            Self::SendMessage { chat_id, text } => RequestBody::json(&SendMessageRequest {
                chat_id: chat_id.clone(),
                text: text.clone(),
            })?,
            Self::SendPhoto {
                chat_id,
                source: PhotoSource::Reference(photo),
                caption,
            } => RequestBody::json(&SendPhotoRequest {
                chat_id: chat_id.clone(),
                photo: photo.clone(),
                caption: non_empty(caption).map(str::to_string),
            })?,
            Self::SendPhoto {
                chat_id,
                source: PhotoSource::Upload(attachment),
                caption,
            } => {
                let mut fields = vec![("chat_id".to_string(), chat_id.clone())];
                if let Some(caption) = non_empty(caption) {
                    fields.push(("caption".to_string(), caption.to_string()));
                }
                RequestBody::Multipart(MultipartBody {
                    fields,
                    file: FilePart {
                        field_name: "photo".to_string(),
                        data: attachment.data.clone(),
                        file_name: attachment.upload_file_name().to_string(),
                        content_type: attachment.upload_content_type().to_string(),
                    },
                })
            }
            Self::SendSticker {
                chat_id,
                sticker_id,
            } => RequestBody::json(&SendStickerRequest {
                chat_id: chat_id.clone(),
                sticker_id: sticker_id.clone(),
            })?,
            Self::SendChatAction { chat_id, action } => RequestBody::json(&SendChatActionRequest {
                chat_id: chat_id.clone(),
                action: *action,
            })?,
            Self::SetWebhook { url, secret_token } => RequestBody::json(&SetWebhookRequest {
                url: url.clone(),
                secret_token: secret_token.clone(),
            })?,
            Self::GetMe | Self::GetWebhookInfo | Self::DeleteWebhook => return Ok(None),
        };

        Ok(Some(body))
    }

    /// Resolve a resource and operation name against one item's parameters.
    ///
    /// # Errors
    ///
    /// - `UnsupportedOperationError` for unknown names
    /// - `ParameterError` for missing or malformed parameters
    pub fn from_parameters(
        resource: &str,
        operation: &str,
        params: &ItemParameters,
    ) -> Result<Self, ClientError> {
        let resource: Resource = resource.parse()?;
        let unknown = || UnsupportedOperationError::Operation {
            resource: resource.to_string(),
            name: operation.to_string(),
        };

        let resolved = match (resource, operation) {
            (Resource::Message, "sendMessage") => Self::SendMessage {
                chat_id: params.get_string("chatId")?,
                text: params.get_string("text")?,
            },
            (Resource::Message, "sendPhoto") => {
                let chat_id = params.get_string("chatId")?;
                let caption = params.get_string_or("caption", "")?;
                let source = if params.get_bool_or("binaryData", false)? {
                    let property =
                        params.get_string_or("binaryPropertyName", DEFAULT_BINARY_PROPERTY)?;
                    PhotoSource::Upload(params.binary(&property)?.clone())
                } else {
                    PhotoSource::Reference(params.get_string("photo")?)
                };
                Self::SendPhoto {
                    chat_id,
                    source,
                    caption: Some(caption).filter(|c| !c.is_empty()),
                }
            }
            (Resource::Message, "sendSticker") => Self::SendSticker {
                chat_id: params.get_string("chatId")?,
                sticker_id: params.get_string("stickerId")?,
            },
            (Resource::Message, "sendChatAction") => Self::SendChatAction {
                chat_id: params.get_string("chatId")?,
                action: params
                    .get_string_or("action", ChatAction::default().as_str())?
                    .parse()?,
            },
            (Resource::Bot, "getMe") => Self::GetMe,
            (Resource::Webhook, "getWebhookInfo") => Self::GetWebhookInfo,
            (Resource::Webhook, "setWebhook") => Self::SetWebhook {
                url: params.get_string("webhookUrl")?,
                secret_token: params.get_string("secretToken")?,
            },
            (Resource::Webhook, "deleteWebhook") => Self::DeleteWebhook,
            _ => return Err(unknown().into()),
        };

        Ok(resolved)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;

//! Error types for Zalo Bot SDK operations.
//!
//! Outbound failures are split by where they originate: the transport
//! ([`RequestError`]), the remote envelope ([`ApiOperationError`]), or the
//! caller's input ([`UnsupportedOperationError`], [`ParameterError`]).
//! Inbound webhook failures are covered by [`WebhookError`].

use thiserror::Error;

/// Transport-level failure of a single outbound HTTP request.
///
/// Carries enough classification for the executor to decide whether another
/// attempt is worthwhile.
#[derive(Debug, Error)]
pub enum RequestError {
    /// Remote answered with a non-success HTTP status.
    #[error("Request failed with status code {status}: {message}")]
    Http { status: u16, message: String },

    /// Connection, TLS, or timeout failure. The request URL is stripped
    /// because it embeds the bot token.
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// Remote answered with a success status but the body was not a valid
    /// response envelope.
    #[error("Invalid response body: {message}")]
    InvalidResponse { message: String },

    /// The request could not be built locally.
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// Every attempt failed without recording an error.
    #[error("Request failed after retries")]
    RetriesExhausted,
}

impl RequestError {
    /// HTTP status associated with this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Check if this error carries a 4xx status.
    ///
    /// Client errors are never retried.
    pub fn is_client_error(&self) -> bool {
        matches!(self.status(), Some(status) if (400..500).contains(&status))
    }

    /// Check if this error represents a condition that may succeed if retried.
    ///
    /// Transient conditions are server errors (5xx) and network failures. A
    /// malformed body on a success status is not retried because the remote
    /// already accepted the request.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::InvalidRequest { .. } | Self::InvalidResponse { .. } => false,
            _ => !self.is_client_error(),
        }
    }
}

/// The remote API reported `ok: false` in its response envelope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{description}")]
pub struct ApiOperationError {
    /// Remote error code, when supplied.
    pub error_code: Option<i64>,

    /// Remote description, or a generic fallback.
    pub description: String,
}

impl ApiOperationError {
    /// Fallback description used when the remote omits one.
    pub const GENERIC_DESCRIPTION: &'static str = "API request failed";

    /// Build from envelope fields, falling back to a generic description.
    pub fn from_envelope(error_code: Option<i64>, description: Option<String>) -> Self {
        Self {
            error_code,
            description: description
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| Self::GENERIC_DESCRIPTION.to_string()),
        }
    }
}

/// The requested resource or operation is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnsupportedOperationError {
    #[error("Unknown resource: {name}")]
    Resource { name: String },

    #[error("Unknown operation: {name}")]
    Operation { resource: String, name: String },
}

/// Per-item parameter extraction failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParameterError {
    /// A required parameter is absent.
    #[error("Missing required parameter: {name}")]
    Missing { name: String },

    /// A parameter is present with the wrong JSON type.
    #[error("Parameter '{name}' must be a {expected}")]
    InvalidType {
        name: String,
        expected: &'static str,
    },

    /// A parameter has a value outside its allowed set.
    #[error("Invalid value for parameter '{name}': {message}")]
    InvalidValue { name: String, message: String },

    /// The named binary attachment is absent from the item.
    #[error("No binary data found for property '{property}'")]
    MissingBinaryData { property: String },
}

/// Any failure of an outbound bot operation.
///
/// Display is transparent so per-item error records carry the underlying
/// message unchanged.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Request(#[from] RequestError),

    #[error(transparent)]
    Api(#[from] ApiOperationError),

    #[error(transparent)]
    Unsupported(#[from] UnsupportedOperationError),

    #[error(transparent)]
    Parameter(#[from] ParameterError),

    /// Result payload did not match the expected shape.
    #[error("Failed to decode API result: {0}")]
    Decode(#[from] serde_json::Error),

    /// The HTTP client could not be constructed.
    #[error("Client configuration error: {message}")]
    Configuration { message: String },
}

/// A batch aborted on its first failing item.
#[derive(Debug, Error)]
#[error("Item {item_index} failed: {source}")]
pub struct BatchError {
    /// Zero-based index of the failing input item.
    pub item_index: usize,

    #[source]
    pub source: ClientError,
}

/// Inbound secret-token authentication failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Missing secret token in webhook request")]
    MissingToken,

    #[error("Invalid secret token in webhook request")]
    InvalidToken,
}

/// Inbound body could not be turned into a JSON object.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    #[error("Invalid JSON in webhook body: {message}")]
    InvalidJson { message: String },

    #[error("Invalid webhook body format: expected a JSON object")]
    InvalidFormat,
}

/// Node-state storage failures.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("State storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("State serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Webhook registration lifecycle failures.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Failed to set webhook: {description}")]
    SetWebhook { description: String },

    #[error("Failed to delete webhook: {description}")]
    DeleteWebhook { description: String },

    #[error("State error: {0}")]
    State(#[from] StateError),
}

/// Failure of one inbound webhook invocation.
///
/// Any of these aborts the invocation with no partial output.
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Payload(#[from] PayloadError),

    #[error(transparent)]
    State(#[from] StateError),
}

impl WebhookError {
    /// HTTP status code to answer the caller with.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Auth(_) => 401,
            Self::Payload(_) => 400,
            Self::State(_) => 500,
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;

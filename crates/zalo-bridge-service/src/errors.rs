//! Error types for the HTTP service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use tracing::{error, warn};
use zalo_bot_sdk::{LifecycleError, WebhookEndpoint, WebhookError};

/// Webhook handler errors with HTTP status code mapping
///
/// - `401 Unauthorized`: the secret token header is missing or wrong
/// - `400 Bad Request`: the body is not a JSON object
/// - `500 Internal Server Error`: the stored secret could not be read
///
/// Messages for server-side failures are replaced with a generic text; the
/// detail is logged.
#[derive(Debug, thiserror::Error)]
pub enum WebhookHandlerError {
    #[error("Webhook rejected: {0}")]
    Rejected(#[from] WebhookError),
}

impl WebhookHandlerError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Rejected(e) => {
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }
}

impl IntoResponse for WebhookHandlerError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = if status.is_server_error() {
            error!(error = %self, "Webhook processing failed");
            "Internal server error occurred. Please try again later.".to_string()
        } else {
            warn!(error = %self, status = %status, "Webhook request rejected");
            self.to_string()
        };

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });

        (status, Json(body)).into_response()
    }
}

/// Service-level errors
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Failed to bind to address {address}: {message}")]
    BindFailed { address: String, message: String },

    #[error("Server failed: {message}")]
    ServerFailed { message: String },

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Startup failed: {message}")]
    StartupFailed { message: String },

    #[error("Failed to activate {endpoint} webhook: {source}")]
    ActivationFailed {
        endpoint: WebhookEndpoint,
        #[source]
        source: LifecycleError,
    },
}

impl ServiceError {
    /// Process exit code for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::BindFailed { .. } => 1,
            Self::ServerFailed { .. } => 2,
            Self::Configuration(_) => 3,
            Self::StartupFailed { .. } => 4,
            Self::ActivationFailed { .. } => 5,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration: {key}")]
    Missing { key: String },

    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

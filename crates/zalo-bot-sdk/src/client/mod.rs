//! Zalo Bot API client.
//!
//! This module provides [`ZaloBotClient`], a typed wrapper around the request
//! executor. Every call targets `{api_base_url}/bot{token}/{method}` and
//! returns either the unwrapped `result` or a typed error.

mod envelope;
mod executor;
mod retry;
mod types;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{ClientError, RequestError};
use crate::operations::{BinaryAttachment, OutboundOperation, PhotoSource};

pub use envelope::{ApiOutcome, ApiResponse};
pub use executor::{FilePart, HttpMethod, MultipartBody, RequestBody, RequestExecutor};
pub use retry::{RetryPolicy, Sleeper, TokioSleeper};
pub use types::{
    BotInfo, ChatAction, SendChatActionRequest, SendMessageRequest, SendPhotoRequest,
    SendStickerRequest, SetWebhookRequest, WebhookInfo,
};

/// Default Zalo Bot API host.
pub const DEFAULT_API_BASE_URL: &str = "https://bot-api.zaloplatforms.com";

/// Configuration for Zalo Bot API client behavior.
///
/// # Examples
///
/// ```
/// use zalo_bot_sdk::client::ClientConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig::default()
///     .with_timeout(Duration::from_secs(10))
///     .with_api_base_url("http://localhost:8080");
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Bot API base URL, without the `/bot{token}` segment
    pub api_base_url: String,
    /// User agent string for API requests
    pub user_agent: String,
    /// Request timeout enforced by the transport
    pub timeout: Duration,
    /// Retry behavior for operation calls
    pub retry_policy: RetryPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            user_agent: "zalo-bot-sdk/0.1.0".to_string(),
            timeout: Duration::from_secs(30),
            retry_policy: RetryPolicy::default(),
        }
    }
}

impl ClientConfig {
    /// Create a new builder for client configuration.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }

    /// Set the API base URL.
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Set the user agent string.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry policy.
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }
}

/// Builder for constructing `ClientConfig` instances.
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_base_url = url.into();
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.config.retry_policy = policy;
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}

/// Bot API token.
///
/// The token is embedded in every request path. Debug output is redacted and
/// memory is zeroed on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct BotToken(String);

impl BotToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Get the raw token value.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for BotToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BotToken(<REDACTED>)")
    }
}

/// Outcome of a credential test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CredentialStatus {
    #[serde(rename = "OK")]
    Ok,
    Error,
}

/// Result of [`ZaloBotClient::test_credentials`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialTestResult {
    pub status: CredentialStatus,
    pub message: String,
}

impl CredentialTestResult {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            status: CredentialStatus::Ok,
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            status: CredentialStatus::Error,
            message: message.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == CredentialStatus::Ok
    }
}

/// Zalo Bot API client.
///
/// Operation calls go through the retrying [`RequestExecutor`]; the
/// `*_once` variants make a single attempt.
///
/// # Examples
///
/// ```no_run
/// # use zalo_bot_sdk::client::{ClientConfig, ZaloBotClient};
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = ZaloBotClient::builder("123456:bot-token")
///     .config(ClientConfig::default())
///     .build()?;
///
/// let me = client.get_me().await?;
/// println!("Bot: {}", me.id);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ZaloBotClient {
    token: BotToken,
    executor: RequestExecutor,
    config: ClientConfig,
}

impl fmt::Debug for ZaloBotClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZaloBotClient")
            .field("token", &self.token)
            .field("config", &self.config)
            .finish()
    }
}

impl ZaloBotClient {
    /// Create a new builder for constructing a client.
    pub fn builder(token: impl Into<String>) -> ZaloBotClientBuilder {
        ZaloBotClientBuilder::new(token)
    }

    /// Get the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Full endpoint URL for an API method.
    pub(crate) fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.config.api_base_url.trim_end_matches('/'),
            self.token.expose(),
            method
        )
    }

    /// Execute an operation under the retry policy and return the raw envelope.
    pub async fn execute_operation(
        &self,
        operation: &OutboundOperation,
    ) -> Result<ApiResponse, RequestError> {
        let method = operation.method_name();
        let body = operation.request_body()?;
        self.executor
            .execute(
                method,
                &self.method_url(method),
                operation.http_method(),
                body.as_ref(),
            )
            .await
    }

    /// Execute an operation with a single attempt.
    pub async fn execute_operation_once(
        &self,
        operation: &OutboundOperation,
    ) -> Result<ApiResponse, RequestError> {
        let method = operation.method_name();
        let body = operation.request_body()?;
        debug!(operation = method, "Sending single-attempt request");
        self.executor
            .send_once(&self.method_url(method), operation.http_method(), body.as_ref())
            .await
    }

    /// Execute an operation and unwrap its output payload.
    ///
    /// The payload is `result` when present, otherwise the whole envelope.
    pub async fn perform(&self, operation: &OutboundOperation) -> Result<Value, ClientError> {
        let response = self.execute_operation(operation).await?;
        Ok(response.into_output()?)
    }

    /// Get the bot's account details.
    pub async fn get_me(&self) -> Result<BotInfo, ClientError> {
        self.execute_operation(&OutboundOperation::GetMe)
            .await?
            .decode()
    }

    /// Get the current webhook registration.
    pub async fn get_webhook_info(&self) -> Result<WebhookInfo, ClientError> {
        self.execute_operation(&OutboundOperation::GetWebhookInfo)
            .await?
            .decode()
    }

    /// Send a text message.
    pub async fn send_message(
        &self,
        chat_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Result<Value, ClientError> {
        self.perform(&OutboundOperation::SendMessage {
            chat_id: chat_id.into(),
            text: text.into(),
        })
        .await
    }

    /// Send a photo by URL or file id.
    pub async fn send_photo(
        &self,
        chat_id: impl Into<String>,
        photo: impl Into<String>,
        caption: Option<String>,
    ) -> Result<Value, ClientError> {
        self.perform(&OutboundOperation::SendPhoto {
            chat_id: chat_id.into(),
            source: PhotoSource::Reference(photo.into()),
            caption,
        })
        .await
    }

    /// Upload a photo from binary data.
    pub async fn send_photo_upload(
        &self,
        chat_id: impl Into<String>,
        attachment: BinaryAttachment,
        caption: Option<String>,
    ) -> Result<Value, ClientError> {
        self.perform(&OutboundOperation::SendPhoto {
            chat_id: chat_id.into(),
            source: PhotoSource::Upload(attachment),
            caption,
        })
        .await
    }

    pub async fn send_sticker(
        &self,
        chat_id: impl Into<String>,
        sticker_id: impl Into<String>,
    ) -> Result<Value, ClientError> {
        self.perform(&OutboundOperation::SendSticker {
            chat_id: chat_id.into(),
            sticker_id: sticker_id.into(),
        })
        .await
    }

    pub async fn send_chat_action(
        &self,
        chat_id: impl Into<String>,
        action: ChatAction,
    ) -> Result<Value, ClientError> {
        self.perform(&OutboundOperation::SendChatAction {
            chat_id: chat_id.into(),
            action,
        })
        .await
    }

    /// Register a webhook URL and the secret the platform must send back.
    pub async fn set_webhook(
        &self,
        url: impl Into<String>,
        secret_token: impl Into<String>,
    ) -> Result<Value, ClientError> {
        self.perform(&OutboundOperation::SetWebhook {
            url: url.into(),
            secret_token: secret_token.into(),
        })
        .await
    }

    pub async fn delete_webhook(&self) -> Result<Value, ClientError> {
        self.perform(&OutboundOperation::DeleteWebhook).await
    }

    /// Check that the configured token is accepted by `getMe`.
    ///
    /// Never fails; problems are reported through the returned status.
    pub async fn test_credentials(&self) -> CredentialTestResult {
        if self.token.is_empty() {
            return CredentialTestResult::error("Bot Token is required");
        }

        match self.execute_operation_once(&OutboundOperation::GetMe).await {
            Ok(response) => match response.into_outcome() {
                ApiOutcome::Success { .. } => {
                    info!("Bot credentials verified");
                    CredentialTestResult::ok("Authentication successful")
                }
                ApiOutcome::Failure { description, .. } => {
                    warn!("Bot credentials rejected");
                    CredentialTestResult::error(
                        description
                            .filter(|d| !d.is_empty())
                            .unwrap_or_else(|| "Authentication failed".to_string()),
                    )
                }
            },
            Err(e) => {
                warn!(error = %e, "Credential test request failed");
                CredentialTestResult::error(e.to_string())
            }
        }
    }
}

/// Builder for [`ZaloBotClient`].
pub struct ZaloBotClientBuilder {
    token: BotToken,
    config: ClientConfig,
    sleeper: Option<Arc<dyn Sleeper>>,
}

impl ZaloBotClientBuilder {
    fn new(token: impl Into<String>) -> Self {
        Self {
            token: BotToken::new(token),
            config: ClientConfig::default(),
            sleeper: None,
        }
    }

    /// Set the client configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the sleeper used between retry attempts.
    pub fn sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = Some(sleeper);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Configuration` if the HTTP client cannot be built.
    pub fn build(self) -> Result<ZaloBotClient, ClientError> {
        let http_client = reqwest::Client::builder()
            .timeout(self.config.timeout)
            .user_agent(&self.config.user_agent)
            .build()
            .map_err(|e| ClientError::Configuration {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        let mut executor = RequestExecutor::new(http_client, self.config.retry_policy.clone());
        if let Some(sleeper) = self.sleeper {
            executor = executor.with_sleeper(sleeper);
        }

        Ok(ZaloBotClient {
            token: self.token,
            executor,
            config: self.config,
        })
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;

// Single-request execution with bounded retry for the Zalo Bot API

use std::sync::Arc;

use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::envelope::ApiResponse;
use super::retry::{RetryPolicy, Sleeper, TokioSleeper};
use crate::error::RequestError;

/// Longest raw error body kept in an error message.
const MAX_ERROR_BODY_CHARS: usize = 512;

/// HTTP methods used by the bot API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

/// Outbound request body.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// Structured body sent as `application/json`.
    Json(Value),

    /// Form with one binary file part, sent as `multipart/form-data`.
    Multipart(MultipartBody),
}

impl RequestBody {
    /// Serialize a typed request model into a JSON body.
    pub fn json<T: Serialize>(request: &T) -> Result<Self, RequestError> {
        serde_json::to_value(request)
            .map(Self::Json)
            .map_err(|e| RequestError::InvalidRequest {
                message: e.to_string(),
            })
    }
}

/// File part of a multipart upload.
#[derive(Debug, Clone, PartialEq)]
pub struct FilePart {
    pub field_name: String,
    pub data: Bytes,
    pub file_name: String,
    pub content_type: String,
}

/// Multipart form description.
///
/// Kept as plain data so a fresh [`Form`] can be built for every attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct MultipartBody {
    pub fields: Vec<(String, String)>,
    pub file: FilePart,
}

impl MultipartBody {
    /// Build the reqwest form, text fields first and the file part last.
    pub fn to_form(&self) -> Result<Form, RequestError> {
        let part = Part::bytes(self.file.data.to_vec())
            .file_name(self.file.file_name.clone())
            .mime_str(&self.file.content_type)
            .map_err(|e| RequestError::InvalidRequest {
                message: format!(
                    "Invalid content type '{}': {}",
                    self.file.content_type, e
                ),
            })?;

        let form = self
            .fields
            .iter()
            .fold(Form::new(), |form, (name, value)| {
                form.text(name.clone(), value.clone())
            });

        Ok(form.part(self.file.field_name.clone(), part))
    }
}

/// Sends one logical request, retrying transient failures.
///
/// Client errors (4xx) fail on the first attempt. Every other failure is
/// retried until the policy's attempt budget is spent, sleeping
/// [`RetryPolicy::delay_for_attempt`] between attempts.
#[derive(Clone)]
pub struct RequestExecutor {
    http_client: reqwest::Client,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl std::fmt::Debug for RequestExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestExecutor")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl RequestExecutor {
    pub fn new(http_client: reqwest::Client, policy: RetryPolicy) -> Self {
        Self {
            http_client,
            policy,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    /// Replace the sleeper used between attempts.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Execute a request under the retry policy.
    ///
    /// `operation` names the API method for logging; the URL itself carries
    /// the bot token and is never logged.
    ///
    /// # Errors
    ///
    /// Returns the first client error encountered, or the last error after
    /// all attempts fail.
    pub async fn execute(
        &self,
        operation: &str,
        url: &str,
        method: HttpMethod,
        body: Option<&RequestBody>,
    ) -> Result<ApiResponse, RequestError> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut last_error: Option<RequestError> = None;

        for attempt in 1..=max_attempts {
            match self.send_once(url, method, body).await {
                Ok(response) => {
                    debug!(operation = operation, attempt = attempt, "Request succeeded");
                    return Ok(response);
                }
                Err(e) if !e.is_transient() => {
                    debug!(
                        operation = operation,
                        attempt = attempt,
                        status = ?e.status(),
                        "Request failed with non-retryable error"
                    );
                    return Err(e);
                }
                Err(e) => {
                    warn!(
                        operation = operation,
                        attempt = attempt,
                        max_attempts = max_attempts,
                        error = %e,
                        "Request attempt failed"
                    );

                    if self.policy.should_retry(attempt) {
                        let delay = self.policy.delay_for_attempt(attempt);
                        debug!(
                            operation = operation,
                            delay_ms = delay.as_millis() as u64,
                            "Waiting before next attempt"
                        );
                        self.sleeper.sleep(delay).await;
                    }

                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or(RequestError::RetriesExhausted))
    }

    /// Send one attempt without retry.
    pub async fn send_once(
        &self,
        url: &str,
        method: HttpMethod,
        body: Option<&RequestBody>,
    ) -> Result<ApiResponse, RequestError> {
        let request = match method {
            HttpMethod::Get => self.http_client.get(url),
            HttpMethod::Post => self.http_client.post(url),
        };

        let request = match body {
            Some(RequestBody::Json(value)) => request.json(value),
            Some(RequestBody::Multipart(multipart)) => request.multipart(multipart.to_form()?),
            None => request.header(CONTENT_TYPE, "application/json"),
        };

        let response = request
            .send()
            .await
            .map_err(|e| RequestError::Network(e.without_url()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| RequestError::Network(e.without_url()))?;

        if !status.is_success() {
            return Err(RequestError::Http {
                status: status.as_u16(),
                message: error_message_from_body(&text),
            });
        }

        serde_json::from_str::<ApiResponse>(&text).map_err(|e| RequestError::InvalidResponse {
            message: e.to_string(),
        })
    }
}

/// Prefer the envelope description; fall back to the (truncated) raw body.
fn error_message_from_body(body: &str) -> String {
    if let Ok(envelope) = serde_json::from_str::<ApiResponse>(body) {
        if let Some(description) = envelope.description.filter(|d| !d.is_empty()) {
            return description;
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "empty response body".to_string();
    }

    trimmed.chars().take(MAX_ERROR_BODY_CHARS).collect()
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;

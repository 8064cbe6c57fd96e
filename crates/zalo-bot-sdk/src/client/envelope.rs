// Response envelope returned by every Zalo Bot API method

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ApiOperationError, ClientError};

/// Wire shape of every Zalo Bot API response.
///
/// `ok` is true exactly when the remote call succeeded; `result` only carries
/// meaning in that case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T = Value> {
    pub ok: bool,

    #[serde(default = "Option::default", skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Any other top-level fields the remote sent.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Tagged view of an [`ApiResponse`].
#[derive(Debug, Clone, PartialEq)]
pub enum ApiOutcome<T> {
    Success {
        result: Option<T>,
    },
    Failure {
        error_code: Option<i64>,
        description: Option<String>,
    },
}

impl<T> ApiResponse<T> {
    /// Convert the flat envelope into its tagged form.
    pub fn into_outcome(self) -> ApiOutcome<T> {
        if self.ok {
            ApiOutcome::Success {
                result: self.result,
            }
        } else {
            ApiOutcome::Failure {
                error_code: self.error_code,
                description: self.description,
            }
        }
    }

    /// Unwrap the envelope, failing with [`ApiOperationError`] when `ok` is false.
    pub fn into_result(self) -> Result<Option<T>, ApiOperationError> {
        match self.into_outcome() {
            ApiOutcome::Success { result } => Ok(result),
            ApiOutcome::Failure {
                error_code,
                description,
            } => Err(ApiOperationError::from_envelope(error_code, description)),
        }
    }
}

impl ApiResponse<Value> {
    /// Output payload for a successful call.
    ///
    /// Returns `result` when present, otherwise the whole envelope including
    /// any unrecognized fields.
    pub fn into_output(self) -> Result<Value, ApiOperationError> {
        if !self.ok {
            return Err(ApiOperationError::from_envelope(
                self.error_code,
                self.description,
            ));
        }

        match self.result {
            Some(result) => Ok(result),
            None => {
                let mut envelope = self.extra;
                envelope.insert("ok".to_string(), Value::Bool(true));
                if let Some(code) = self.error_code {
                    envelope.insert("error_code".to_string(), Value::from(code));
                }
                if let Some(description) = self.description {
                    envelope.insert("description".to_string(), Value::String(description));
                }
                Ok(Value::Object(envelope))
            }
        }
    }

    /// Unwrap and decode `result` into a typed value.
    pub fn decode<T: DeserializeOwned>(self) -> Result<T, ClientError> {
        let result = self.into_result()?.unwrap_or(Value::Null);
        Ok(serde_json::from_value(result)?)
    }
}

#[cfg(test)]
#[path = "envelope_tests.rs"]
mod tests;

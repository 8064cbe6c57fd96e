// Inbound webhook body parsing

use serde_json::Value;

use crate::error::PayloadError;

/// Parse an inbound body into a JSON object.
///
/// # Errors
///
/// - `PayloadError::InvalidJson` if the body is not valid UTF-8 JSON
/// - `PayloadError::InvalidFormat` if the JSON is not an object
pub fn parse_payload(body: &[u8]) -> Result<Value, PayloadError> {
    let value: Value = serde_json::from_slice(body).map_err(|e| PayloadError::InvalidJson {
        message: e.to_string(),
    })?;

    if !value.is_object() {
        return Err(PayloadError::InvalidFormat);
    }

    Ok(value)
}

#[cfg(test)]
#[path = "payload_tests.rs"]
mod tests;

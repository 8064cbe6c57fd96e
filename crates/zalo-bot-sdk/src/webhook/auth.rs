//! Secret-token authentication for inbound webhook calls.
//!
//! The platform echoes the secret registered with `setWebhook` in the
//! `x-bot-api-secret-token` header. Tokens are compared in constant time.

use std::collections::HashMap;

use rand::distributions::Alphanumeric;
use rand::Rng;
use subtle::ConstantTimeEq;

use crate::error::AuthError;

/// Header carrying the shared secret on every callback.
pub const SECRET_TOKEN_HEADER: &str = "x-bot-api-secret-token";

/// Length of generated secret tokens.
pub const SECRET_TOKEN_LENGTH: usize = 48;

/// Generate a fresh secret token.
///
/// Samples [`SECRET_TOKEN_LENGTH`] characters from `[A-Za-z0-9]` using the
/// thread-local CSPRNG, so the value is safe to place in an HTTP header.
pub fn generate_secret_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SECRET_TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

/// Authenticate an inbound request against the stored secret.
///
/// With no stored secret, or an empty one, the check is skipped. Header names
/// are matched case-insensitively.
///
/// # Errors
///
/// - `AuthError::MissingToken` if a secret is stored but the header is absent
/// - `AuthError::InvalidToken` if the header value differs from the secret
pub fn authenticate(
    headers: &HashMap<String, String>,
    stored_secret: Option<&str>,
) -> Result<(), AuthError> {
    let Some(expected) = stored_secret.filter(|secret| !secret.is_empty()) else {
        return Ok(());
    };

    let provided = headers
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(SECRET_TOKEN_HEADER))
        .map(|(_, value)| value.as_str())
        .ok_or(AuthError::MissingToken)?;

    if tokens_match(provided.as_bytes(), expected.as_bytes()) {
        Ok(())
    } else {
        Err(AuthError::InvalidToken)
    }
}

/// Length check first, then a constant-time byte comparison.
fn tokens_match(provided: &[u8], expected: &[u8]) -> bool {
    if provided.len() != expected.len() {
        return false;
    }

    provided.ct_eq(expected).into()
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;

//! Webhook handler trait for application-provided delivery processing.

use async_trait::async_trait;
use std::error::Error;

use super::classifier::WebhookOutput;

/// Receives routed webhook deliveries.
///
/// Handlers run in spawned tasks after the inbound call has been answered.
/// Errors are logged and do not affect the HTTP response.
///
/// # Examples
///
/// ```rust
/// use zalo_bot_sdk::webhook::{WebhookHandler, WebhookOutput};
/// use async_trait::async_trait;
///
/// struct StickerCounter;
///
/// #[async_trait]
/// impl WebhookHandler for StickerCounter {
///     async fn handle_delivery(
///         &self,
///         output: &WebhookOutput,
///     ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
///         if let Some(channel) = output.channel {
///             println!("delivery on {}", channel);
///         }
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait WebhookHandler: Send + Sync {
    async fn handle_delivery(
        &self,
        output: &WebhookOutput,
    ) -> Result<(), Box<dyn Error + Send + Sync>>;
}

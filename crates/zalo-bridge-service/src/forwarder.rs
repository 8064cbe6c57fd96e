//! Downstream forwarding of routed deliveries.
//!
//! Each delivery's payload is POSTed as JSON to the URL configured for its
//! channel. Deliveries on a channel without a URL are dropped with a log line.

use std::error::Error;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};
use zalo_bot_sdk::webhook::{WebhookHandler, WebhookOutput};

use crate::config::ForwardingConfig;

/// Header carrying the endpoint identity (`default` or `smart`).
pub const ENDPOINT_HEADER: &str = "x-zalo-endpoint";

/// Header carrying the channel key for smart-endpoint deliveries.
pub const CHANNEL_HEADER: &str = "x-zalo-channel";

/// Forwards deliveries to per-channel downstream URLs.
#[derive(Debug, Clone)]
pub struct ChannelForwarder {
    http_client: reqwest::Client,
    config: ForwardingConfig,
}

impl ChannelForwarder {
    /// # Errors
    ///
    /// Returns the reqwest error if the HTTP client cannot be built.
    pub fn new(config: ForwardingConfig) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            http_client,
            config,
        })
    }
}

#[async_trait]
impl WebhookHandler for ChannelForwarder {
    async fn handle_delivery(
        &self,
        output: &WebhookOutput,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        let channel = output.channel.map(|c| c.key());

        let Some(target) = self.config.target_for(output) else {
            debug!(
                endpoint = %output.endpoint,
                channel = ?channel,
                "No downstream target configured; delivery dropped"
            );
            return Ok(());
        };

        let mut request = self
            .http_client
            .post(target)
            .header(ENDPOINT_HEADER, output.endpoint.as_str())
            .json(&output.payload);
        if let Some(channel) = channel {
            request = request.header(CHANNEL_HEADER, channel);
        }

        let response = request.send().await?.error_for_status()?;

        info!(
            endpoint = %output.endpoint,
            channel = ?channel,
            status = %response.status(),
            "Delivery forwarded"
        );
        Ok(())
    }
}

#[cfg(test)]
#[path = "forwarder_tests.rs"]
mod tests;

//! Inbound webhook intake.
//!
//! For each call the receiver loads the stored secret, authenticates the
//! request, parses the body and routes it. Any failure aborts the call with
//! no delivery.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use super::auth::authenticate;
use super::classifier::{route, WebhookEndpoint, WebhookOutput};
use super::handler::WebhookHandler;
use super::payload::parse_payload;
use super::state::{NodeId, NodeStateStore, SECRET_TOKEN_KEY};
use crate::error::WebhookError;

/// Raw inbound request.
#[derive(Debug, Clone)]
pub struct WebhookRequest {
    headers: HashMap<String, String>,
    body: Bytes,
}

impl WebhookRequest {
    /// Header names are stored lowercased.
    pub fn new(headers: HashMap<String, String>, body: Bytes) -> Self {
        let headers = headers
            .into_iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value))
            .collect();
        Self { headers, body }
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

/// Authenticates, parses and routes inbound webhook calls for one node.
pub struct WebhookReceiver {
    store: Arc<dyn NodeStateStore>,
    node_id: NodeId,
    handlers: Arc<RwLock<Vec<Arc<dyn WebhookHandler>>>>,
}

impl WebhookReceiver {
    pub fn new(store: Arc<dyn NodeStateStore>, node_id: NodeId) -> Self {
        Self {
            store,
            node_id,
            handlers: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    /// Register a handler for dispatched deliveries.
    pub async fn add_handler(&self, handler: Arc<dyn WebhookHandler>) {
        let mut handlers = self.handlers.write().await;
        handlers.push(handler);
    }

    /// Authenticate, parse and route one inbound call.
    ///
    /// # Errors
    ///
    /// - `WebhookError::State` if the stored secret cannot be read
    /// - `WebhookError::Auth` if the secret token check fails
    /// - `WebhookError::Payload` if the body is not a JSON object
    pub async fn receive(
        &self,
        endpoint: WebhookEndpoint,
        request: &WebhookRequest,
    ) -> Result<WebhookOutput, WebhookError> {
        let stored_secret = self
            .store
            .get(&self.node_id, SECRET_TOKEN_KEY)
            .await?
            .filter(|secret| !secret.is_empty());

        if let Err(e) = authenticate(request.headers(), stored_secret.as_deref()) {
            warn!(endpoint = %endpoint, error = %e, "Webhook authentication failed");
            return Err(e.into());
        }

        if stored_secret.is_none() {
            debug!(endpoint = %endpoint, "No secret registered, authentication skipped");
        }

        let payload = parse_payload(request.body()).map_err(|e| {
            warn!(endpoint = %endpoint, error = %e, "Webhook body rejected");
            e
        })?;

        let output = route(payload, endpoint);

        info!(
            endpoint = %endpoint,
            channel = ?output.channel.map(|c| c.key()),
            "Webhook routed"
        );

        Ok(output)
    }

    /// Receive a call and hand the delivery to every registered handler.
    ///
    /// Handlers run in spawned tasks; the routed output is returned without
    /// waiting for them.
    pub async fn dispatch(
        &self,
        endpoint: WebhookEndpoint,
        request: &WebhookRequest,
    ) -> Result<WebhookOutput, WebhookError> {
        let output = self.receive(endpoint, request).await?;

        let handlers = self.handlers.clone();
        let delivery = output.clone();
        tokio::spawn(async move {
            let handlers_guard = handlers.read().await;
            for handler in handlers_guard.iter() {
                let handler_clone = handler.clone();
                let delivery_clone = delivery.clone();

                tokio::spawn(async move {
                    if let Err(e) = handler_clone.handle_delivery(&delivery_clone).await {
                        error!(
                            endpoint = %delivery_clone.endpoint,
                            error = %e,
                            "Webhook handler failed"
                        );
                    }
                });
            }
        });

        Ok(output)
    }
}

#[cfg(test)]
#[path = "receiver_tests.rs"]
mod tests;

//! Webhook registration lifecycle.
//!
//! Each endpoint identity moves between unregistered and registered through
//! `check_exists`, `create` and `delete`. Both identities store their secret
//! under the same [`SECRET_TOKEN_KEY`], so only the most recently created
//! endpoint validates inbound calls against a matching secret.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::auth::generate_secret_token;
use super::classifier::WebhookEndpoint;
use super::state::{NodeId, NodeStateStore, SECRET_TOKEN_KEY};
use crate::client::{ApiOutcome, ZaloBotClient};
use crate::error::{LifecycleError, StateError};
use crate::operations::OutboundOperation;

/// Fallback when the remote omits a failure description.
const UNKNOWN_ERROR: &str = "Unknown error";

/// Where callbacks are exposed and whether to register them remotely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleConfig {
    /// Public origin of the service, e.g. `https://bridge.example.com`.
    pub public_base_url: String,

    /// Path segment identifying this node's webhooks.
    pub path: String,

    /// When false no remote calls are made; registration is manual.
    pub register_automatically: bool,
}

/// A created registration.
#[derive(Clone, PartialEq, Eq)]
pub struct WebhookRegistration {
    pub secret_token: String,
    pub registered_url: String,
}

impl fmt::Debug for WebhookRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookRegistration")
            .field("secret_token", &"<REDACTED>")
            .field("registered_url", &self.registered_url)
            .finish()
    }
}

/// Result of activating an endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivationOutcome {
    /// Remote already points at this endpoint and a secret is stored.
    AlreadyRegistered,

    /// A new secret was generated and stored (and registered remotely when
    /// automatic registration is on).
    Registered(WebhookRegistration),
}

/// Activation hooks invoked by the hosting process.
#[async_trait]
pub trait LifecycleHooks: Send + Sync {
    async fn on_activate(
        &self,
        endpoint: WebhookEndpoint,
    ) -> Result<ActivationOutcome, LifecycleError>;

    async fn on_deactivate(&self, endpoint: WebhookEndpoint) -> Result<(), LifecycleError>;
}

/// Registers, verifies and removes the remote webhook for one node.
///
/// Remote calls here are single attempt.
#[derive(Clone)]
pub struct WebhookLifecycle {
    client: ZaloBotClient,
    store: Arc<dyn NodeStateStore>,
    node_id: NodeId,
    config: LifecycleConfig,
}

impl fmt::Debug for WebhookLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookLifecycle")
            .field("node_id", &self.node_id)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl WebhookLifecycle {
    pub fn new(
        client: ZaloBotClient,
        store: Arc<dyn NodeStateStore>,
        node_id: NodeId,
        config: LifecycleConfig,
    ) -> Self {
        Self {
            client,
            store,
            node_id,
            config,
        }
    }

    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    /// Public callback URL for an endpoint.
    pub fn callback_url(&self, endpoint: WebhookEndpoint) -> String {
        format!(
            "{}/{}/{}",
            self.config.public_base_url.trim_end_matches('/'),
            self.config.path.trim_matches('/'),
            endpoint.path_suffix()
        )
    }

    /// Currently stored secret, if any. An empty value counts as none.
    pub async fn stored_secret(&self) -> Result<Option<String>, StateError> {
        Ok(self
            .store
            .get(&self.node_id, SECRET_TOKEN_KEY)
            .await?
            .filter(|secret| !secret.is_empty()))
    }

    /// Check whether the remote webhook points at this endpoint.
    ///
    /// Always false when automatic registration is off. Transport failures
    /// count as not existing.
    pub async fn check_exists(&self, endpoint: WebhookEndpoint) -> bool {
        if !self.config.register_automatically {
            return false;
        }

        let response = match self
            .client
            .execute_operation_once(&OutboundOperation::GetWebhookInfo)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(endpoint = %endpoint, error = %e, "Webhook info lookup failed");
                return false;
            }
        };

        let expected = self.callback_url(endpoint);
        let registered = match response.into_outcome() {
            ApiOutcome::Success { result: Some(info) } => info
                .get("url")
                .and_then(|url| url.as_str())
                .map(str::to_string),
            _ => None,
        };

        let exists = matches!(registered.as_deref(), Some(url) if !url.is_empty() && url == expected);
        debug!(endpoint = %endpoint, exists = exists, "Checked remote webhook registration");
        exists
    }

    /// Generate and store a new secret, then register the endpoint remotely.
    ///
    /// # Errors
    ///
    /// - `LifecycleError::State` if the secret cannot be stored
    /// - `LifecycleError::SetWebhook` if the remote call fails
    pub async fn create(
        &self,
        endpoint: WebhookEndpoint,
    ) -> Result<WebhookRegistration, LifecycleError> {
        let registered_url = self.callback_url(endpoint);
        let secret_token = generate_secret_token();

        self.store
            .put(&self.node_id, SECRET_TOKEN_KEY, secret_token.clone())
            .await?;

        let registration = WebhookRegistration {
            secret_token,
            registered_url,
        };

        if !self.config.register_automatically {
            info!(endpoint = %endpoint, "Stored webhook secret; remote registration is manual");
            return Ok(registration);
        }

        let operation = OutboundOperation::SetWebhook {
            url: registration.registered_url.clone(),
            secret_token: registration.secret_token.clone(),
        };

        let response = self
            .client
            .execute_operation_once(&operation)
            .await
            .map_err(|e| LifecycleError::SetWebhook {
                description: e.to_string(),
            })?;

        if let ApiOutcome::Failure { description, .. } = response.into_outcome() {
            return Err(LifecycleError::SetWebhook {
                description: description_or_unknown(description),
            });
        }

        info!(
            endpoint = %endpoint,
            url = %registration.registered_url,
            "Webhook registered"
        );
        Ok(registration)
    }

    /// Remove the remote webhook and clear the stored secret.
    ///
    /// With automatic registration on, the secret is cleared only after the
    /// remote call succeeds.
    ///
    /// # Errors
    ///
    /// - `LifecycleError::DeleteWebhook` if the remote call fails
    /// - `LifecycleError::State` if the secret cannot be cleared
    pub async fn delete(&self, endpoint: WebhookEndpoint) -> Result<(), LifecycleError> {
        if !self.config.register_automatically {
            self.store.remove(&self.node_id, SECRET_TOKEN_KEY).await?;
            info!(endpoint = %endpoint, "Cleared webhook secret; remote registration is manual");
            return Ok(());
        }

        let response = self
            .client
            .execute_operation_once(&OutboundOperation::DeleteWebhook)
            .await
            .map_err(|e| LifecycleError::DeleteWebhook {
                description: e.to_string(),
            })?;

        if let ApiOutcome::Failure { description, .. } = response.into_outcome() {
            return Err(LifecycleError::DeleteWebhook {
                description: description_or_unknown(description),
            });
        }

        self.store.remove(&self.node_id, SECRET_TOKEN_KEY).await?;

        info!(endpoint = %endpoint, "Webhook deleted");
        Ok(())
    }
}

#[async_trait]
impl LifecycleHooks for WebhookLifecycle {
    /// Create the registration unless the remote already points here and a
    /// secret is on record.
    async fn on_activate(
        &self,
        endpoint: WebhookEndpoint,
    ) -> Result<ActivationOutcome, LifecycleError> {
        if self.check_exists(endpoint).await && self.stored_secret().await?.is_some() {
            info!(endpoint = %endpoint, "Webhook already registered");
            return Ok(ActivationOutcome::AlreadyRegistered);
        }

        self.create(endpoint)
            .await
            .map(ActivationOutcome::Registered)
    }

    async fn on_deactivate(&self, endpoint: WebhookEndpoint) -> Result<(), LifecycleError> {
        self.delete(endpoint).await
    }
}

fn description_or_unknown(description: Option<String>) -> String {
    description
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| UNKNOWN_ERROR.to_string())
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;

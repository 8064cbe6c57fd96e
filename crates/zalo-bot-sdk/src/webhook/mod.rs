//! Inbound webhook processing and registration.
//!
//! # Core Components
//!
//! - [`authenticate`] - Secret-token check with constant-time comparison
//! - [`classify`] / [`route`] - Five-channel classification for the smart endpoint
//! - [`WebhookReceiver`] - Authenticate, parse and route one inbound call
//! - [`WebhookLifecycle`] - Register, verify and remove the remote webhook
//! - [`NodeStateStore`] - Persistent per-node storage for the secret token
//!
//! # Endpoints
//!
//! Two endpoint identities exist side by side. The default endpoint delivers
//! the raw update to a single output. The smart endpoint delivers it to one of
//! five outputs chosen by [`classify`]. Both share one stored secret.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::collections::HashMap;
//! use std::sync::Arc;
//! use zalo_bot_sdk::webhook::{
//!     InMemoryNodeStateStore, NodeId, WebhookEndpoint, WebhookReceiver, WebhookRequest,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(InMemoryNodeStateStore::new());
//! let receiver = WebhookReceiver::new(store, NodeId::new("orders-trigger"));
//!
//! let headers = HashMap::from([(
//!     "x-bot-api-secret-token".to_string(),
//!     "registered-secret".to_string(),
//! )]);
//! let body = bytes::Bytes::from_static(br#"{"event_name":"message.text.received"}"#);
//!
//! let output = receiver
//!     .receive(WebhookEndpoint::Smart, &WebhookRequest::new(headers, body))
//!     .await?;
//! println!("channel: {:?}", output.channel);
//! # Ok(())
//! # }
//! ```

mod auth;
mod classifier;
mod handler;
mod lifecycle;
mod payload;
mod receiver;
mod state;

pub use auth::{authenticate, generate_secret_token, SECRET_TOKEN_HEADER, SECRET_TOKEN_LENGTH};
pub use classifier::{
    classify, route, OutputChannel, WebhookEndpoint, WebhookOutput, EVENT_IMAGE_RECEIVED,
    EVENT_STICKER_RECEIVED, EVENT_TEXT_RECEIVED, EVENT_UNSUPPORTED_RECEIVED,
};
pub use handler::WebhookHandler;
pub use lifecycle::{
    ActivationOutcome, LifecycleConfig, LifecycleHooks, WebhookLifecycle, WebhookRegistration,
};
pub use payload::parse_payload;
pub use receiver::{WebhookReceiver, WebhookRequest};
pub use state::{
    FileNodeStateStore, InMemoryNodeStateStore, NodeId, NodeStateStore, SECRET_TOKEN_KEY,
};

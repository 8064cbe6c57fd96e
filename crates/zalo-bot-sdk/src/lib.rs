//! # Zalo Bot SDK
//!
//! Client and webhook toolkit for bridging a workflow engine to the Zalo Bot
//! HTTP API.
//!
//! This SDK provides:
//! - A resilient request executor with capped exponential backoff
//! - A typed bot client and a batch operation dispatcher
//! - Secret-token authentication for inbound webhook callbacks
//! - Classification of inbound events into five output channels
//! - Webhook registration lifecycle management
//!
//! # Examples
//!
//! ## Sending a message
//!
//! ```rust,no_run
//! use zalo_bot_sdk::client::ZaloBotClient;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ZaloBotClient::builder("123456:bot-token").build()?;
//! let message = client.send_message("chat-id", "hello").await?;
//! println!("Sent: {}", message);
//! # Ok(())
//! # }
//! ```
//!
//! ## Classifying an inbound event
//!
//! ```rust
//! use zalo_bot_sdk::webhook::{classify, OutputChannel};
//!
//! let payload = serde_json::json!({
//!     "event_name": "message.image.received",
//!     "message": { "caption": "look at this" }
//! });
//! assert_eq!(classify(&payload), OutputChannel::PhotoWithMessage);
//! ```

// Public modules
pub mod client;
pub mod error;
pub mod operations;
pub mod webhook;

// Re-export commonly used types at crate root for convenience
pub use error::{
    ApiOperationError, AuthError, BatchError, ClientError, LifecycleError, ParameterError,
    PayloadError, RequestError, StateError, UnsupportedOperationError, WebhookError,
};

pub use client::{
    ApiOutcome, ApiResponse, BotToken, ClientConfig, CredentialStatus, CredentialTestResult,
    RetryPolicy, ZaloBotClient,
};
pub use operations::{
    BatchOptions, BinaryAttachment, ItemParameters, OperationDispatcher, OutboundOperation,
    OutputRecord, Resource,
};
pub use webhook::{
    NodeId, NodeStateStore, OutputChannel, WebhookEndpoint, WebhookLifecycle, WebhookOutput,
    WebhookReceiver, WebhookRequest,
};

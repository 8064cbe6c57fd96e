//! # Zalo Bridge Service
//!
//! HTTP service receiving Zalo Bot webhook callbacks.
//!
//! This crate provides:
//! - The default and smart webhook routes with secret-token authentication
//! - Webhook activation on startup and deactivation on shutdown
//! - Forwarding of routed deliveries to per-channel downstream URLs
//! - Health check endpoint

pub mod config;
pub mod errors;
pub mod forwarder;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{HeaderMap, HeaderValue},
    middleware,
    response::{Json, Response},
    routing::{get, post},
    Router,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, sync::Arc, time::Duration};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{error, info, instrument, warn};
use zalo_bot_sdk::webhook::{
    FileNodeStateStore, InMemoryNodeStateStore, LifecycleHooks, NodeStateStore, OutputChannel,
    WebhookEndpoint, WebhookLifecycle, WebhookReceiver, WebhookRequest,
};
use zalo_bot_sdk::ZaloBotClient;

pub use config::{
    load_config, BotConfig, ForwardingConfig, LoggingConfig, ServerConfig, ServiceConfig,
    StateConfig, WebhookSettings,
};
pub use errors::{ConfigError, ServiceError, WebhookHandlerError};
pub use forwarder::ChannelForwarder;

/// Correlation header read from and written to every request.
pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

// ============================================================================
// Application State
// ============================================================================

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServiceConfig>,
    pub receiver: Arc<WebhookReceiver>,
}

impl AppState {
    pub fn new(config: ServiceConfig, receiver: Arc<WebhookReceiver>) -> Self {
        Self {
            config: Arc::new(config),
            receiver,
        }
    }
}

// ============================================================================
// HTTP Server
// ============================================================================

/// Create HTTP router with all endpoints
pub fn create_router(state: AppState) -> Router {
    let webhook_routes = Router::new()
        .route(
            &state.config.webhook.route_path(WebhookEndpoint::Default),
            post(handle_default_webhook),
        )
        .route(
            &state.config.webhook.route_path(WebhookEndpoint::Smart),
            post(handle_smart_webhook),
        );

    let health_routes = Router::new().route("/health", get(handle_health_check));

    let max_body_size = state.config.server.max_body_size;

    Router::new()
        .merge(webhook_routes)
        .merge(health_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn(request_logging_middleware))
                .layer(DefaultBodyLimit::max(max_body_size))
                .into_inner(),
        )
        .with_state(state)
}

/// Build the state store selected by configuration.
pub fn build_state_store(config: &StateConfig) -> Arc<dyn NodeStateStore> {
    match config {
        StateConfig::Memory => Arc::new(InMemoryNodeStateStore::new()),
        StateConfig::File { path } => Arc::new(FileNodeStateStore::new(path.clone())),
    }
}

/// Run the activation hook for each endpoint in order.
///
/// Stops at the first failure.
pub async fn activate_endpoints(
    hooks: &dyn LifecycleHooks,
    endpoints: &[WebhookEndpoint],
) -> Result<(), ServiceError> {
    for &endpoint in endpoints {
        let outcome = hooks
            .on_activate(endpoint)
            .await
            .map_err(|source| ServiceError::ActivationFailed { endpoint, source })?;
        info!(endpoint = %endpoint, outcome = ?outcome, "Webhook endpoint activated");
    }
    Ok(())
}

/// Run the deactivation hook for each endpoint.
///
/// Failures are logged and do not stop the remaining endpoints.
pub async fn deactivate_endpoints(hooks: &dyn LifecycleHooks, endpoints: &[WebhookEndpoint]) {
    for &endpoint in endpoints {
        match hooks.on_deactivate(endpoint).await {
            Ok(()) => info!(endpoint = %endpoint, "Webhook endpoint deactivated"),
            Err(e) => warn!(endpoint = %endpoint, error = %e, "Webhook deactivation failed"),
        }
    }
}

/// Start HTTP server
///
/// Binds the listener, activates the configured endpoints, serves until
/// SIGINT or SIGTERM, then deactivates the same endpoints.
pub async fn start_server(config: ServiceConfig) -> Result<(), ServiceError> {
    config.validate()?;

    let client = ZaloBotClient::builder(config.bot.token.clone())
        .config(config.client_config())
        .build()
        .map_err(|e| ServiceError::StartupFailed {
            message: e.to_string(),
        })?;

    let store = build_state_store(&config.state);
    let node_id = config.node_id();

    let receiver = Arc::new(WebhookReceiver::new(store.clone(), node_id.clone()));
    let forwarder = ChannelForwarder::new(config.forwarding.clone()).map_err(|e| {
        ServiceError::StartupFailed {
            message: format!("Failed to create forwarding client: {}", e),
        }
    })?;
    receiver.add_handler(Arc::new(forwarder)).await;

    let lifecycle = WebhookLifecycle::new(client, store, node_id, config.lifecycle_config());
    let endpoints = config.webhook.endpoints.clone();
    let shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout_seconds);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| ServiceError::BindFailed {
            address: addr.clone(),
            message: e.to_string(),
        })?;

    info!(address = %addr, "HTTP server listening");

    // The callback must be reachable before the platform is told about it.
    activate_endpoints(&lifecycle, &endpoints).await?;

    let state = AppState::new(config, receiver);
    let app = create_router(state);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ServiceError::ServerFailed {
            message: e.to_string(),
        });

    if tokio::time::timeout(
        shutdown_timeout,
        deactivate_endpoints(&lifecycle, &endpoints),
    )
    .await
    .is_err()
    {
        warn!(
            timeout_seconds = shutdown_timeout.as_secs(),
            "Webhook deactivation timed out"
        );
    }

    info!("HTTP server shutdown complete");
    served
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C signal handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), initiating graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        },
    }
}

// ============================================================================
// Webhook Handlers
// ============================================================================

/// Handle calls on the default endpoint
#[instrument(skip(state, headers, body))]
pub async fn handle_default_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>, WebhookHandlerError> {
    handle_webhook(&state, WebhookEndpoint::Default, &headers, body).await
}

/// Handle calls on the smart endpoint
#[instrument(skip(state, headers, body))]
pub async fn handle_smart_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>, WebhookHandlerError> {
    handle_webhook(&state, WebhookEndpoint::Smart, &headers, body).await
}

/// Authenticate, route and dispatch one call.
///
/// Downstream forwarding runs after the response has been produced.
async fn handle_webhook(
    state: &AppState,
    endpoint: WebhookEndpoint,
    headers: &HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>, WebhookHandlerError> {
    info!(endpoint = %endpoint, "Received webhook request");

    let header_map: HashMap<String, String> = headers
        .iter()
        .map(|(k, v)| {
            (
                k.as_str().to_lowercase(),
                v.to_str().unwrap_or("").to_string(),
            )
        })
        .collect();

    let request = WebhookRequest::new(header_map, body);
    let output = state.receiver.dispatch(endpoint, &request).await?;

    Ok(Json(WebhookResponse {
        status: "received".to_string(),
        endpoint: output.endpoint,
        channel: output.channel,
    }))
}

// ============================================================================
// Health Check Handlers
// ============================================================================

/// Basic health check endpoint
#[instrument]
async fn handle_health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============================================================================
// Middleware
// ============================================================================

/// Incoming `x-correlation-id`, or a fresh UUID when absent or empty.
fn resolve_correlation_id(headers: &HeaderMap) -> String {
    headers
        .get(CORRELATION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

/// Records the correlation ID on the request span, echoes it in the response
/// and logs one completion event per request.
#[instrument(skip_all, fields(
    method = %request.method(),
    uri = %request.uri(),
    correlation_id
))]
async fn request_logging_middleware(
    request: axum::extract::Request,
    next: axum::middleware::Next,
) -> Response {
    let start = std::time::Instant::now();
    let correlation_id = resolve_correlation_id(request.headers());
    tracing::Span::current().record("correlation_id", correlation_id.as_str());

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&correlation_id) {
        response.headers_mut().insert(CORRELATION_ID_HEADER, value);
    }

    let status = response.status().as_u16();
    let elapsed_ms = start.elapsed().as_millis() as u64;
    match status {
        500.. => error!(status, elapsed_ms, "Request failed"),
        400..=499 => warn!(status, elapsed_ms, "Request rejected"),
        _ => info!(status, elapsed_ms, "Request completed"),
    }

    response
}

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookResponse {
    pub status: String,
    pub endpoint: WebhookEndpoint,

    /// Smart-endpoint channel; absent for the default endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<OutputChannel>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

//! # Zalo Bridge Service
//!
//! Binary entry point for the Zalo Bridge HTTP service.
//!
//! This executable:
//! - Loads configuration from files and the environment
//! - Initializes logging
//! - Starts the HTTP server, which registers the webhook on startup and
//!   removes it on shutdown

use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use zalo_bridge_service::config::CONFIG_FILE_ENV;
use zalo_bridge_service::{load_config, start_server, LoggingConfig, ServiceConfig};

#[tokio::main]
async fn main() {
    // -------------------------------------------------------------------------
    // Load configuration
    //
    // Sources (applied in order, later sources override earlier ones):
    //  1. /etc/zalo-bridge/service.yaml   system-wide defaults
    //  2. ./config/service.yaml           deployment-local override
    //  3. Path given by ZB_CONFIG_FILE    operator-specified file
    //  4. Environment variables prefixed ZB__ (double-underscore separator)
    //     e.g. ZB__BOT__TOKEN=123:abc sets bot.token
    // -------------------------------------------------------------------------
    let explicit_path = std::env::var(CONFIG_FILE_ENV).ok();

    let service_config: ServiceConfig = match load_config(explicit_path.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            init_tracing(&LoggingConfig::default());
            error!(error = %e, "Failed to load configuration; aborting");
            std::process::exit(3);
        }
    };

    init_tracing(&service_config.logging);

    info!("Starting Zalo Bridge Service");

    if let Err(e) = service_config.validate() {
        error!(error = %e, "Service configuration is invalid; aborting");
        std::process::exit(3);
    }

    info!(
        host = %service_config.server.host,
        port = service_config.server.port,
        endpoints = ?service_config.webhook.endpoints,
        "Starting HTTP server"
    );

    if let Err(e) = start_server(service_config).await {
        error!(error = %e, "Service stopped with an error");
        std::process::exit(e.exit_code());
    }
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "zalo_bridge_service={level},zalo_bot_sdk={level},tower_http=info",
            level = logging.level
        )
        .into()
    });

    let registry = tracing_subscriber::registry().with(filter);

    if logging.json_format {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

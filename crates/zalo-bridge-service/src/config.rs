//! Service configuration.
//!
//! Every field carries a serde default, so an absent file or an empty
//! environment yields a complete configuration. [`ServiceConfig::validate`]
//! rejects values the service cannot start with.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;
use url::Url;
use zalo_bot_sdk::client::{ClientConfig, DEFAULT_API_BASE_URL};
use zalo_bot_sdk::webhook::{LifecycleConfig, NodeId, WebhookEndpoint, WebhookOutput};
use zalo_bot_sdk::OutputChannel;

use crate::errors::ConfigError;

/// Prefix for environment overrides, e.g. `ZB__SERVER__PORT=9090`.
pub const ENV_PREFIX: &str = "ZB";

/// Environment variable naming an explicit configuration file.
pub const CONFIG_FILE_ENV: &str = "ZB_CONFIG_FILE";

const SYSTEM_CONFIG_FILE: &str = "/etc/zalo-bridge/service";
const LOCAL_CONFIG_FILE: &str = "config/service";

/// Service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// HTTP server settings
    pub server: ServerConfig,

    /// Outbound bot API settings
    pub bot: BotConfig,

    /// Inbound webhook settings
    pub webhook: WebhookSettings,

    /// Where the registered secret is kept
    pub state: StateConfig,

    /// Downstream targets per output channel
    pub forwarding: ForwardingConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl ServiceConfig {
    /// Check that the service can start with this configuration.
    ///
    /// # Errors
    ///
    /// - `ConfigError::Missing` when a required value is empty
    /// - `ConfigError::Invalid` when a value is malformed
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bot.token.trim().is_empty() {
            return Err(ConfigError::Missing {
                key: "bot.token".to_string(),
            });
        }
        parse_http_url("bot.api_base_url", &self.bot.api_base_url)?;

        if self.bot.timeout_seconds == 0 {
            return Err(ConfigError::Invalid {
                message: "bot.timeout_seconds must be greater than zero".to_string(),
            });
        }

        if self.webhook.path.trim_matches('/').is_empty() {
            return Err(ConfigError::Missing {
                key: "webhook.path".to_string(),
            });
        }
        if self.webhook.path.trim_matches('/').contains('/') {
            return Err(ConfigError::Invalid {
                message: format!(
                    "webhook.path must be a single path segment, got '{}'",
                    self.webhook.path
                ),
            });
        }
        if self.webhook.node_id.trim().is_empty() {
            return Err(ConfigError::Missing {
                key: "webhook.node_id".to_string(),
            });
        }
        if self.webhook.endpoints.is_empty() {
            return Err(ConfigError::Missing {
                key: "webhook.endpoints".to_string(),
            });
        }

        if self.webhook.public_base_url.trim().is_empty() {
            if self.webhook.register_automatically {
                return Err(ConfigError::Missing {
                    key: "webhook.public_base_url".to_string(),
                });
            }
        } else {
            parse_http_url("webhook.public_base_url", &self.webhook.public_base_url)?;
        }

        if let StateConfig::File { path } = &self.state {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::Missing {
                    key: "state.path".to_string(),
                });
            }
        }

        for (key, value) in self.forwarding.targets() {
            if let Some(target) = value {
                parse_http_url(key, target)?;
            }
        }

        Ok(())
    }

    /// Client settings for outbound calls.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::default()
            .with_api_base_url(self.bot.api_base_url.clone())
            .with_timeout(Duration::from_secs(self.bot.timeout_seconds))
    }

    /// Registration settings for the lifecycle manager.
    pub fn lifecycle_config(&self) -> LifecycleConfig {
        LifecycleConfig {
            public_base_url: self.webhook.public_base_url.clone(),
            path: self.webhook.path.trim_matches('/').to_string(),
            register_automatically: self.webhook.register_automatically,
        }
    }

    pub fn node_id(&self) -> NodeId {
        NodeId::new(self.webhook.node_id.clone())
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Time allowed for webhook deactivation after a shutdown signal
    pub shutdown_timeout_seconds: u64,

    /// Maximum request size in bytes
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            shutdown_timeout_seconds: 30,
            max_body_size: 10 * 1024 * 1024, // 10MB
        }
    }
}

/// Outbound bot API configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Bot token issued by the platform
    pub token: String,

    pub api_base_url: String,

    /// Per-request timeout
    pub timeout_seconds: u64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout_seconds: 30,
        }
    }
}

impl fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotConfig")
            .field("token", &"<REDACTED>")
            .field("api_base_url", &self.api_base_url)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

/// Inbound webhook configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookSettings {
    /// Public origin the platform calls back, e.g. `https://bridge.example.com`
    pub public_base_url: String,

    /// Path segment in front of `/webhook` and `/webhook-smart`
    pub path: String,

    /// Register the callback with the platform on startup
    pub register_automatically: bool,

    /// Key for the stored secret
    pub node_id: String,

    /// Endpoints activated on startup
    ///
    /// Both endpoints share one stored secret, so activating both leaves only
    /// the later one authenticating successfully.
    pub endpoints: Vec<WebhookEndpoint>,
}

impl Default for WebhookSettings {
    fn default() -> Self {
        Self {
            public_base_url: String::new(),
            path: "default".to_string(),
            register_automatically: true,
            node_id: "zalo-bridge".to_string(),
            endpoints: vec![WebhookEndpoint::Smart],
        }
    }
}

impl WebhookSettings {
    /// Route path served for an endpoint.
    pub fn route_path(&self, endpoint: WebhookEndpoint) -> String {
        format!("/{}/{}", self.path.trim_matches('/'), endpoint.path_suffix())
    }
}

/// Node-state backend
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StateConfig {
    /// Lost on restart
    #[default]
    Memory,

    /// JSON document on disk
    File { path: PathBuf },
}

/// Downstream targets for routed deliveries
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForwardingConfig {
    /// Target for the default endpoint
    pub default_url: Option<String>,

    pub text_message: Option<String>,
    pub photo_only: Option<String>,
    pub photo_with_message: Option<String>,
    pub sticker: Option<String>,
    pub unsupported: Option<String>,

    /// Per-delivery timeout
    pub timeout_seconds: u64,
}

impl Default for ForwardingConfig {
    fn default() -> Self {
        Self {
            default_url: None,
            text_message: None,
            photo_only: None,
            photo_with_message: None,
            sticker: None,
            unsupported: None,
            timeout_seconds: 10,
        }
    }
}

impl ForwardingConfig {
    /// Target URL for a routed delivery, if one is configured.
    pub fn target_for(&self, output: &WebhookOutput) -> Option<&str> {
        let target = match output.channel {
            None => &self.default_url,
            Some(OutputChannel::TextMessage) => &self.text_message,
            Some(OutputChannel::PhotoOnly) => &self.photo_only,
            Some(OutputChannel::PhotoWithMessage) => &self.photo_with_message,
            Some(OutputChannel::Sticker) => &self.sticker,
            Some(OutputChannel::Unsupported) => &self.unsupported,
        };
        target.as_deref().filter(|url| !url.trim().is_empty())
    }

    fn targets(&self) -> [(&'static str, Option<&str>); 6] {
        fn non_empty(v: &Option<String>) -> Option<&str> {
            v.as_deref().filter(|url| !url.trim().is_empty())
        }

        [
            ("forwarding.default_url", non_empty(&self.default_url)),
            ("forwarding.text_message", non_empty(&self.text_message)),
            ("forwarding.photo_only", non_empty(&self.photo_only)),
            (
                "forwarding.photo_with_message",
                non_empty(&self.photo_with_message),
            ),
            ("forwarding.sticker", non_empty(&self.sticker)),
            ("forwarding.unsupported", non_empty(&self.unsupported)),
        ]
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    pub level: String,

    /// Enable JSON structured logging
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Load configuration from files and the environment.
///
/// Sources, later ones overriding earlier ones:
///  1. `/etc/zalo-bridge/service.yaml`
///  2. `./config/service.yaml`
///  3. `explicit_path`, which must exist when given
///  4. `ZB__`-prefixed environment variables, `__` separating sections
///
/// The result is not validated.
pub fn load_config(explicit_path: Option<&str>) -> Result<ServiceConfig, ConfigError> {
    let mut builder = config::Config::builder()
        .add_source(
            config::File::with_name(SYSTEM_CONFIG_FILE)
                .required(false)
                .format(config::FileFormat::Yaml),
        )
        .add_source(
            config::File::with_name(LOCAL_CONFIG_FILE)
                .required(false)
                .format(config::FileFormat::Yaml),
        );

    if let Some(path) = explicit_path.filter(|p| !p.is_empty()) {
        info!(path = %path, "Loading configuration from explicit path");
        builder = builder.add_source(
            config::File::with_name(path)
                .required(true)
                .format(config::FileFormat::Yaml),
        );
    }

    let config = builder
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("webhook.endpoints")
                .try_parsing(true),
        )
        .build()?;

    Ok(config.try_deserialize()?)
}

fn parse_http_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value).map_err(|e| ConfigError::Invalid {
        message: format!("{} is not a valid URL: {}", key, e),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::Invalid {
            message: format!("{} must use http or https, got '{}'", key, other),
        }),
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

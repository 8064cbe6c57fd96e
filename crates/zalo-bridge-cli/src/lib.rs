//! # Zalo Bot CLI
//!
//! Command-line interface for the Zalo Bot API.
//!
//! This module provides CLI commands for:
//! - Sending messages, photos, stickers and chat actions
//! - Inspecting, registering and removing the bot webhook
//! - Running one operation over a batch of items from a JSON file
//! - Verifying the bot token

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;
use zalo_bot_sdk::client::{ChatAction, DEFAULT_API_BASE_URL};
use zalo_bot_sdk::webhook::generate_secret_token;
use zalo_bot_sdk::{
    BatchError, BatchOptions, BinaryAttachment, ClientConfig, ClientError, ItemParameters,
    OperationDispatcher, RetryPolicy, ZaloBotClient,
};

// ============================================================================
// CLI Structure
// ============================================================================

/// Zalo Bot CLI - call the Zalo Bot API from the command line
#[derive(Parser, Debug)]
#[command(name = "zalo-bot")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Call the Zalo Bot API from the command line")]
pub struct Cli {
    /// Bot token
    #[arg(long, env = "ZALO_BOT_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// API base URL
    #[arg(long, env = "ZALO_API_URL", default_value = DEFAULT_API_BASE_URL)]
    pub api_url: String,

    /// Request timeout in seconds
    #[arg(long, default_value = "30")]
    pub timeout: u64,

    /// Attempts per request, including the first
    #[arg(long, default_value = "3")]
    pub max_attempts: u32,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    pub format: OutputFormat,

    /// Logging level
    #[arg(short, long, default_value = "warn")]
    pub log_level: String,

    /// Enable JSON logging
    #[arg(long)]
    pub json_logs: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the bot account
    GetMe,

    /// Check that the token is accepted
    TestCredentials,

    /// Send a text message
    SendMessage {
        #[arg(long)]
        chat_id: String,

        #[arg(long)]
        text: String,
    },

    /// Send a photo by URL or upload one from disk
    SendPhoto {
        #[arg(long)]
        chat_id: String,

        /// Photo URL or file id
        #[arg(long, conflicts_with = "file", required_unless_present = "file")]
        photo: Option<String>,

        /// Local file to upload
        #[arg(long)]
        file: Option<PathBuf>,

        /// Content type of the upload; guessed from the extension when omitted
        #[arg(long, requires = "file")]
        mime_type: Option<String>,

        #[arg(long)]
        caption: Option<String>,
    },

    /// Send a sticker
    SendSticker {
        #[arg(long)]
        chat_id: String,

        #[arg(long)]
        sticker_id: String,
    },

    /// Show a chat action such as typing
    ChatAction {
        #[arg(long)]
        chat_id: String,

        #[arg(long, default_value = "typing")]
        action: ChatAction,
    },

    /// Webhook management commands
    Webhook {
        #[command(subcommand)]
        action: WebhookCommands,
    },

    /// Run one operation for every item in a JSON file
    Batch {
        /// Resource name: message, bot or webhook
        #[arg(long)]
        resource: String,

        /// Operation name, e.g. sendMessage
        #[arg(long)]
        operation: String,

        /// JSON array of items
        #[arg(long)]
        items: PathBuf,

        /// Record failing items as errors instead of stopping
        #[arg(long)]
        continue_on_failure: bool,
    },
}

/// Webhook management subcommands
#[derive(Subcommand, Debug)]
pub enum WebhookCommands {
    /// Show the current registration
    Info,

    /// Register a callback URL
    Set {
        #[arg(long)]
        url: String,

        /// Secret the platform sends back; generated when omitted
        #[arg(long)]
        secret_token: Option<String>,
    },

    /// Remove the registration
    Delete,
}

/// Output format options
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON
    Json,
    /// YAML output
    Yaml,
}

// ============================================================================
// Error Types
// ============================================================================

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Batch(#[from] BatchError),

    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("{0:#}")]
    Input(anyhow::Error),

    #[error("Failed to render output: {message}")]
    Output { message: String },

    #[error("Credential test failed: {message}")]
    CredentialsRejected { message: String },
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Client(_) | Self::Batch(_) => 1,
            Self::InvalidArgument { .. } => 2,
            Self::Input(_) => 3,
            Self::Output { .. } => 4,
            Self::CredentialsRejected { .. } => 5,
        }
    }
}

// ============================================================================
// Items File
// ============================================================================

/// One entry of a batch items file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemFileEntry {
    #[serde(default)]
    pub json: Map<String, Value>,

    #[serde(default)]
    pub binary: HashMap<String, BinaryFileRef>,
}

/// A file to attach as a named binary property.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinaryFileRef {
    /// Relative paths resolve against the items file's directory
    pub path: PathBuf,

    #[serde(default)]
    pub file_name: Option<String>,

    #[serde(default)]
    pub mime_type: Option<String>,
}

/// Load batch items from a JSON file.
pub fn load_items(path: &Path) -> anyhow::Result<Vec<ItemParameters>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read items file {}", path.display()))?;
    let entries: Vec<ItemFileEntry> = serde_json::from_str(&content)
        .with_context(|| format!("Items file {} is not a JSON array of items", path.display()))?;

    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));

    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            let mut params = ItemParameters::from_json(Value::Object(entry.json));
            for (name, file) in entry.binary {
                let file_path = base_dir.join(&file.path);
                let attachment = read_attachment(&file_path, file.file_name, file.mime_type)
                    .with_context(|| format!("Item {}: binary property '{}'", index, name))?;
                params = params.with_binary(name, attachment);
            }
            Ok(params)
        })
        .collect()
}

/// Read a file into an upload attachment.
///
/// The file name defaults to the path's final component and the content type
/// is guessed from the extension unless given.
pub fn read_attachment(
    path: &Path,
    file_name: Option<String>,
    mime_type: Option<String>,
) -> anyhow::Result<BinaryAttachment> {
    let data = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;

    let mut attachment = BinaryAttachment::new(data);

    let file_name = file_name.or_else(|| {
        path.file_name()
            .map(|name| name.to_string_lossy().into_owned())
    });
    if let Some(file_name) = file_name {
        attachment = attachment.with_file_name(file_name);
    }

    let mime_type = mime_type.or_else(|| {
        mime_guess::from_path(path)
            .first()
            .map(|mime| mime.essence_str().to_string())
    });
    if let Some(mime_type) = mime_type {
        attachment = attachment.with_mime_type(mime_type);
    }

    Ok(attachment)
}

// ============================================================================
// Main Entry Point
// ============================================================================

/// Main CLI entry point
pub async fn run_cli() -> Result<(), CliError> {
    let cli = Cli::parse();

    initialize_logging(&cli);

    let format = cli.format;
    let output = execute(cli).await?;
    println!("{}", render(&output, format)?);
    Ok(())
}

/// Initialize logging to stderr so command output stays parseable.
fn initialize_logging(cli: &Cli) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "zalo_bridge_cli={level},zalo_bot_sdk={level}",
            level = cli.log_level
        )
        .into()
    });

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

/// Build the client from global options.
pub fn build_client(cli: &Cli, token: &str) -> Result<ZaloBotClient, CliError> {
    if cli.max_attempts == 0 {
        return Err(CliError::InvalidArgument {
            message: "--max-attempts must be at least 1".to_string(),
        });
    }

    let config = ClientConfig::default()
        .with_api_base_url(cli.api_url.clone())
        .with_timeout(Duration::from_secs(cli.timeout))
        .with_retry_policy(RetryPolicy {
            max_attempts: cli.max_attempts,
            ..RetryPolicy::default()
        });

    Ok(ZaloBotClient::builder(token).config(config).build()?)
}

/// Execute the parsed command and return its result document.
pub async fn execute(cli: Cli) -> Result<Value, CliError> {
    let token = cli.token.clone().unwrap_or_default();

    // The credential test reports a missing token itself.
    let requires_token = !matches!(cli.command, Commands::TestCredentials);
    if requires_token && token.trim().is_empty() {
        return Err(CliError::InvalidArgument {
            message: "Bot token is required (--token or ZALO_BOT_TOKEN)".to_string(),
        });
    }

    let client = build_client(&cli, &token)?;

    match cli.command {
        Commands::TestCredentials => {
            let result = client.test_credentials().await;
            if !result.is_ok() {
                return Err(CliError::CredentialsRejected {
                    message: result.message,
                });
            }
            to_value(&result)
        }
        Commands::GetMe => to_value(&client.get_me().await?),
        Commands::SendMessage { chat_id, text } => {
            Ok(client.send_message(chat_id, text).await?)
        }
        Commands::SendPhoto {
            chat_id,
            photo,
            file,
            mime_type,
            caption,
        } => match (photo, file) {
            (_, Some(file)) => {
                let attachment =
                    read_attachment(&file, None, mime_type).map_err(CliError::Input)?;
                Ok(client.send_photo_upload(chat_id, attachment, caption).await?)
            }
            (Some(photo), None) => Ok(client.send_photo(chat_id, photo, caption).await?),
            (None, None) => Err(CliError::InvalidArgument {
                message: "either --photo or --file is required".to_string(),
            }),
        },
        Commands::SendSticker {
            chat_id,
            sticker_id,
        } => Ok(client.send_sticker(chat_id, sticker_id).await?),
        Commands::ChatAction { chat_id, action } => {
            Ok(client.send_chat_action(chat_id, action).await?)
        }
        Commands::Webhook { action } => execute_webhook_command(&client, action).await,
        Commands::Batch {
            resource,
            operation,
            items,
            continue_on_failure,
        } => {
            let items = load_items(&items).map_err(CliError::Input)?;
            info!(
                resource = %resource,
                operation = %operation,
                count = items.len(),
                "Running batch"
            );
            let dispatcher = OperationDispatcher::new(client);
            let records = dispatcher
                .execute_batch(
                    &resource,
                    &operation,
                    &items,
                    BatchOptions {
                        continue_on_failure,
                    },
                )
                .await?;
            to_value(&records)
        }
    }
}

async fn execute_webhook_command(
    client: &ZaloBotClient,
    action: WebhookCommands,
) -> Result<Value, CliError> {
    match action {
        WebhookCommands::Info => to_value(&client.get_webhook_info().await?),
        WebhookCommands::Set { url, secret_token } => {
            let secret_token = secret_token.unwrap_or_else(generate_secret_token);
            let result = client.set_webhook(url.clone(), secret_token.clone()).await?;
            Ok(serde_json::json!({
                "url": url,
                "secret_token": secret_token,
                "result": result,
            }))
        }
        WebhookCommands::Delete => Ok(client.delete_webhook().await?),
    }
}

/// Render a result document in the requested format.
pub fn render(value: &Value, format: OutputFormat) -> Result<String, CliError> {
    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(value).map_err(|e| CliError::Output {
                message: e.to_string(),
            })
        }
        OutputFormat::Yaml => serde_yaml::to_string(value).map_err(|e| CliError::Output {
            message: e.to_string(),
        }),
    }
}

fn to_value<T: Serialize>(value: &T) -> Result<Value, CliError> {
    serde_json::to_value(value).map_err(|e| CliError::Output {
        message: e.to_string(),
    })
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

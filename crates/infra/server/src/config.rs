//! Server configuration.

use std::path::Path;

use webhook_client_core::catalog::CapabilityCatalog;
use webhook_client_core::config::WebhookConfig;
use webhook_client_core::error::WebhookClientError;
use webhook_client_core::settings::WebhookClientSettings;

/// Loads settings from a TOML file.
pub fn load_config(path: impl AsRef<Path>) -> Result<WebhookClientSettings, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::IoError(format!("{}: {e}", path.display())))?;

    WebhookClientSettings::from_toml_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Builds every configured webhook through `catalog`.
pub fn build_configs(
    settings: &WebhookClientSettings,
    catalog: &CapabilityCatalog,
) -> Result<Vec<WebhookConfig>, ConfigError> {
    if settings.webhooks.is_empty() {
        return Err(ConfigError::NoWebhooks);
    }
    settings.build_configs(catalog).map_err(ConfigError::from)
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("No [[webhooks]] configured")]
    NoWebhooks,
    #[error(transparent)]
    Webhook(#[from] WebhookClientError),
}

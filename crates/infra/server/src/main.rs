//! Webhook Client Server binary.

use tracing_subscriber::EnvFilter;
use webhook_client_core::catalog::CapabilityCatalog;
use webhook_client_server::{WebhookServer, load_config};

const DEFAULT_CONFIG_PATH: &str = "webhook-client.toml";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("WEBHOOK_CLIENT_CONFIG").ok())
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let settings = load_config(&path)?;

    // Initialize tracing; RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.server.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    tracing::info!(config = %path, webhooks = settings.webhooks.len(), "Loaded configuration");

    // Create and run server
    let server = WebhookServer::new(settings, &CapabilityCatalog::new())?;
    server.run().await?;

    Ok(())
}

//! # Webhook Client Server
//!
//! Standalone webhook receiver: serves every configured webhook over HTTP,
//! stores accepted calls in memory and runs process tasks in the background.

mod config;
mod worker;

pub use config::{ConfigError, build_configs, load_config};
pub use worker::{LoggingTaskHandler, TaskOutcome, TaskWorker, prune_once, run_pruner};

use std::sync::Arc;

use webhook_client_adapter_memory::{InMemoryTaskQueue, MemoryCallStore};
use webhook_client_axum::{WebhookRouter, WebhookRoutes};
use webhook_client_core::catalog::CapabilityCatalog;
use webhook_client_core::config::ConfigRegistry;
use webhook_client_core::processor::WebhookProcessor;
use webhook_client_core::queue::TaskHandler;
use webhook_client_core::settings::WebhookClientSettings;
use webhook_client_events::{EventBus, TracingHandler};

/// A fully wired webhook server.
pub struct WebhookServer {
    settings: WebhookClientSettings,
    registry: Arc<ConfigRegistry>,
    store: Arc<MemoryCallStore>,
    queue: Arc<InMemoryTaskQueue>,
    events: Arc<EventBus>,
    handlers: Vec<Arc<dyn TaskHandler>>,
}

impl WebhookServer {
    /// Builds configs from `settings` and wires the in-memory collaborators.
    pub fn new(
        settings: WebhookClientSettings,
        catalog: &CapabilityCatalog,
    ) -> Result<Self, ConfigError> {
        let configs = build_configs(&settings, catalog)?;

        Ok(Self {
            settings,
            registry: Arc::new(ConfigRegistry::from_configs(configs)),
            store: MemoryCallStore::shared(),
            queue: InMemoryTaskQueue::shared(),
            events: Arc::new(EventBus::new()),
            handlers: vec![Arc::new(LoggingTaskHandler)],
        })
    }

    /// Adds a task handler. A handler for an already handled task ref replaces it.
    pub fn with_handler(mut self, handler: Arc<dyn TaskHandler>) -> Self {
        self.handlers.push(handler);
        self
    }

    pub fn settings(&self) -> &WebhookClientSettings {
        &self.settings
    }

    pub fn registry(&self) -> &Arc<ConfigRegistry> {
        &self.registry
    }

    pub fn store(&self) -> &Arc<MemoryCallStore> {
        &self.store
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    /// Builds the HTTP routes for every configured webhook.
    pub fn router(&self) -> Result<WebhookRouter, ConfigError> {
        let processor = Arc::new(
            WebhookProcessor::new(self.registry.clone(), self.store.clone(), self.queue.clone())
                .with_notifications(self.events.clone()),
        );

        let routes = self.settings.webhooks.iter().fold(
            WebhookRoutes::new(processor)
                .add_unique_token_to_route_name(self.settings.server.add_unique_token_to_route_name),
            |routes, webhook| routes.route(webhook.route(), &webhook.name),
        );

        Ok(routes.build()?)
    }

    /// Builds the task worker with every registered handler.
    pub fn worker(&self) -> TaskWorker {
        self.handlers.iter().fold(
            TaskWorker::new(self.store.clone(), self.queue.clone(), self.events.clone()),
            |worker, handler| worker.with_handler(handler.clone()),
        )
    }

    /// Starts the background jobs and serves HTTP until the process exits.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        let router = self.router()?;
        for binding in router.bindings() {
            tracing::info!(route = %binding.name, path = %binding.path, config = %binding.config_name, "Serving webhook");
        }

        self.events.on("webhook.*", TracingHandler).await;
        tokio::spawn(self.worker().run());

        let prune_interval = self.settings.server.prune_interval_secs;
        if prune_interval > 0 {
            tokio::spawn(run_pruner(
                self.registry.clone(),
                self.store.clone(),
                std::time::Duration::from_secs(prune_interval),
            ));
        }

        let address = self.settings.server.address();
        let listener = tokio::net::TcpListener::bind(&address).await?;
        tracing::info!("Starting Webhook Client Server on {}", address);

        axum::serve(listener, router.into_router()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SETTINGS: &str = r#"
        [server]
        add_unique_token_to_route_name = true

        [[webhooks]]
        name = "stripe"
        signing_secret = "abc123"

        [[webhooks]]
        name = "github"
        signing_secret = "def456"
        route = "/hooks/github"
    "#;

    #[tokio::test]
    async fn test_server_wiring() {
        let settings = WebhookClientSettings::from_toml_str(SETTINGS).unwrap();
        let server = WebhookServer::new(settings, &CapabilityCatalog::new()).unwrap();

        assert_eq!(server.registry().names().await, vec!["github", "stripe"]);

        let router = server.router().unwrap();
        let bindings = router.bindings();
        assert_eq!(bindings.len(), 2);
        assert_eq!(bindings[0].path, "/webhooks/stripe");
        assert_eq!(bindings[1].path, "/hooks/github");
        assert!(bindings[0].name.starts_with("webhook-client-stripe-"));
    }

    #[test]
    fn test_invalid_settings_are_rejected() {
        let settings = WebhookClientSettings::from_toml_str(
            "[[webhooks]]\nname = \"stripe\"\nstore_headers = \"SOME\"\nsigning_secret = \"s\"\n",
        )
        .unwrap();

        assert!(WebhookServer::new(settings, &CapabilityCatalog::new()).is_err());
    }
}

//! # Webhook Client
//!
//! Receive webhooks from third-party services, verify their signatures,
//! store an immutable record of every accepted call and hand the work off to
//! an asynchronous task engine, without blocking the HTTP response on
//! business logic.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use webhook_client::prelude::*;
//! use webhook_client_adapter_memory::{InMemoryTaskQueue, MemoryCallStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), WebhookClientError> {
//!     let registry = ConfigRegistry::new();
//!     registry
//!         .register(WebhookConfig::builder("stripe").signing_secret("whsec").build()?)
//!         .await;
//!
//!     let processor = WebhookProcessor::new(
//!         Arc::new(registry),
//!         MemoryCallStore::shared(),
//!         InMemoryTaskQueue::shared(),
//!     );
//!
//!     let outcome = processor.process(request).await?;
//!     Ok(())
//! }
//! ```
//!
//! Enable the `axum` feature for the HTTP surface and `memory` for the
//! in-memory store and queue.

// Re-export core types
pub use webhook_client_core::*;

#[cfg(feature = "axum")]
pub use webhook_client_axum as axum;

#[cfg(feature = "memory")]
pub use webhook_client_adapter_memory as memory;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use std::sync::Arc;
    pub use webhook_client_core::catalog::CapabilityCatalog;
    pub use webhook_client_core::config::{ConfigRegistry, StoreHeaders, WebhookConfig};
    pub use webhook_client_core::error::{WebhookClientError, WebhookClientResult};
    pub use webhook_client_core::processor::{PipelineStage, ProcessedWebhook, WebhookProcessor};
    pub use webhook_client_core::profile::WebhookProfile;
    pub use webhook_client_core::queue::{TaskHandler, TaskQueue};
    pub use webhook_client_core::request::IncomingWebhook;
    pub use webhook_client_core::response::{RespondsTo, WebhookResponse};
    pub use webhook_client_core::signature::SignatureValidator;
    pub use webhook_client_core::storage::WebhookCallStore;
}

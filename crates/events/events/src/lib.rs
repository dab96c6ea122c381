//! # Webhook Client Events
//!
//! Notification plumbing for the webhook client:
//! - Typed events with a namespace, name and version
//! - Pub/sub event bus with async handlers
//! - Bounded in-memory history for inspection
//!
//! ## Example
//!
//! ```rust,ignore
//! use webhook_client_events::{Event, EventBus, webhook_events};
//!
//! let bus = EventBus::new();
//!
//! bus.on(webhook_events::INVALID_SIGNATURE, AlertHandler::new()).await;
//!
//! bus.emit_sync(Event::simple(
//!     webhook_events::INVALID_SIGNATURE,
//!     serde_json::json!({ "config_name": "stripe" }),
//! ))
//! .await;
//! ```

mod bus;
mod error;
mod event;
mod handler;

pub use bus::EventBus;
pub use error::EventError;
pub use event::{Event, EventMetadata, EventType};
pub use handler::{EventHandler, HandlerResult, TracingHandler};

/// Event type constants emitted by the webhook client.
pub mod webhook_events {
    /// Emitted when an inbound call fails signature validation.
    pub const INVALID_SIGNATURE: &str = "webhook.invalid_signature";
    /// Emitted by task workers when processing a stored call fails.
    pub const PROCESSING_FAILED: &str = "webhook.processing_failed";
}

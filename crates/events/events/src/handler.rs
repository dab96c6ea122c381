//! Subscribers and delivery results.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::EventError;
use crate::event::Event;

/// Outcome of delivering one event to one subscriber.
#[derive(Debug, Clone)]
pub struct HandlerResult {
    pub handler_id: String,
    /// Error message when the handler failed.
    pub error: Option<String>,
    pub elapsed: Duration,
}

impl HandlerResult {
    pub fn delivered(handler_id: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            handler_id: handler_id.into(),
            error: None,
            elapsed,
        }
    }

    pub fn failed(handler_id: impl Into<String>, error: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            handler_id: handler_id.into(),
            error: Some(error.into()),
            elapsed,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// A subscriber on the [`EventBus`](crate::EventBus).
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Identifier used in logs and delivery results.
    fn id(&self) -> &str;

    async fn handle(&self, event: &Event) -> Result<(), EventError>;
}

/// Writes every event it receives to the `tracing` log.
///
/// Events under the `webhook` namespace are logged as warnings since they
/// report rejected or failed calls.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingHandler;

#[async_trait]
impl EventHandler for TracingHandler {
    fn id(&self) -> &str {
        "tracing"
    }

    async fn handle(&self, event: &Event) -> Result<(), EventError> {
        let event_type = event.simple_type_string();
        if event.event_type.namespace == "webhook" {
            tracing::warn!(event = %event_type, source = %event.metadata.source, payload = %event.payload, "Webhook notification");
        } else {
            tracing::info!(event = %event_type, source = %event.metadata.source, "Notification");
        }
        Ok(())
    }
}

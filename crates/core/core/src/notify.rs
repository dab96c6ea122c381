//! Notifications emitted by the pipeline.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use webhook_client_events::{Event, EventBus, webhook_events};

use crate::request::{Headers, IncomingWebhook};

/// Raised when an inbound call fails signature validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvalidSignatureEvent {
    /// Config the call was routed to.
    pub config_name: String,
    /// Every header of the offending request.
    pub headers: Headers,
}

impl InvalidSignatureEvent {
    pub fn from_request(request: &IncomingWebhook) -> Self {
        Self {
            config_name: request.config_name().to_string(),
            headers: request.headers().clone(),
        }
    }
}

/// Observability sink for pipeline notifications.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Publishes an invalid-signature notification.
    ///
    /// Sink failures are logged by the sink; they never change the response.
    async fn invalid_signature(&self, event: InvalidSignatureEvent);
}

#[async_trait]
impl NotificationSink for EventBus {
    async fn invalid_signature(&self, event: InvalidSignatureEvent) {
        let source = event.config_name.clone();
        let event = Event::simple(webhook_events::INVALID_SIGNATURE, event).with_source(source);
        self.emit_sync(event).await;
    }
}

/// Sink that drops every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

#[async_trait]
impl NotificationSink for NoopSink {
    async fn invalid_signature(&self, _event: InvalidSignatureEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_event_bus_records_invalid_signature() {
        let bus = EventBus::new();
        let request = IncomingWebhook::new("stripe", "{}", [("Signature", "bogus")]);

        bus.invalid_signature(InvalidSignatureEvent::from_request(&request)).await;

        let events = bus.events_of_type(webhook_events::INVALID_SIGNATURE).await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].metadata.source, "stripe");

        let payload: InvalidSignatureEvent = events[0].payload_as().unwrap();
        assert_eq!(payload.config_name, "stripe");
        assert_eq!(payload.headers.get("signature").map(String::as_str), Some("bogus"));
    }
}

//! Event bus for pub/sub communication.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

use crate::event::Event;
use crate::handler::{EventHandler, HandlerResult};

type SharedHandler = Arc<dyn EventHandler>;

/// The event bus for publishing and subscribing to events.
pub struct EventBus {
    /// Subscribers mapped by event type pattern.
    subscribers: RwLock<HashMap<String, Vec<SharedHandler>>>,
    /// Wildcard subscribers (receive all events).
    wildcard_subscribers: RwLock<Vec<SharedHandler>>,
    /// Recently emitted events, oldest first.
    history: RwLock<VecDeque<Event>>,
    /// Maximum history size.
    max_history: usize,
}

impl EventBus {
    /// Creates a new event bus.
    pub fn new() -> Self {
        Self::with_history_size(1000)
    }

    /// Creates an event bus with custom history size.
    pub fn with_history_size(max_history: usize) -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
            wildcard_subscribers: RwLock::new(Vec::new()),
            history: RwLock::new(VecDeque::new()),
            max_history,
        }
    }

    /// Subscribes to a specific event type or pattern.
    ///
    /// Patterns support:
    /// - Exact match: "webhook.invalid_signature"
    /// - Namespace wildcard: "webhook.*"
    /// - All events: "*"
    pub async fn on(&self, pattern: &str, handler: impl EventHandler + 'static) {
        if pattern == "*" {
            self.on_all(handler).await;
        } else {
            let mut subs = self.subscribers.write().await;
            subs.entry(pattern.to_string())
                .or_default()
                .push(Arc::new(handler));
        }
    }

    /// Subscribes to all events.
    pub async fn on_all(&self, handler: impl EventHandler + 'static) {
        let mut subs = self.wildcard_subscribers.write().await;
        subs.push(Arc::new(handler));
    }

    /// Emits an event to all matching subscribers without waiting for them.
    pub async fn emit(&self, event: Event) {
        self.store_in_history(event.clone()).await;

        for handler in self.collect_handlers(&event).await {
            let event = event.clone();
            tokio::spawn(async move {
                if let Err(e) = handler.handle(&event).await {
                    tracing::error!(handler = handler.id(), error = %e, "event handler failed");
                }
            });
        }
    }

    /// Emits an event and waits for all handlers to complete.
    pub async fn emit_sync(&self, event: Event) -> Vec<HandlerResult> {
        self.store_in_history(event.clone()).await;

        let handlers = self.collect_handlers(&event).await;
        let mut results = Vec::with_capacity(handlers.len());

        for handler in handlers {
            let start = Instant::now();
            let result = handler.handle(&event).await;

            results.push(match result {
                Ok(()) => HandlerResult::delivered(handler.id(), start.elapsed()),
                Err(e) => {
                    tracing::error!(handler = handler.id(), error = %e, "event handler failed");
                    HandlerResult::failed(handler.id(), e.to_string(), start.elapsed())
                }
            });
        }

        results
    }

    /// Gets events of a specific type from history.
    pub async fn events_of_type(&self, event_type: &str) -> Vec<Event> {
        let history = self.history.read().await;
        history
            .iter()
            .filter(|e| e.event_type.matches(event_type))
            .cloned()
            .collect()
    }

    async fn store_in_history(&self, event: Event) {
        if self.max_history == 0 {
            return;
        }
        let mut history = self.history.write().await;
        if history.len() >= self.max_history {
            history.pop_front();
        }
        history.push_back(event);
    }

    async fn collect_handlers(&self, event: &Event) -> Vec<SharedHandler> {
        let mut handlers = Vec::new();

        let subs = self.subscribers.read().await;
        for (pattern, pattern_handlers) in subs.iter() {
            if event.event_type.matches(pattern) {
                handlers.extend(pattern_handlers.iter().cloned());
            }
        }

        let wildcards = self.wildcard_subscribers.read().await;
        handlers.extend(wildcards.iter().cloned());

        handlers
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

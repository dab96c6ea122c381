//! Event types and structures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// An event that can be emitted and handled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Unique identifier for this event instance.
    pub id: String,
    /// The event type (namespace + name + version).
    pub event_type: EventType,
    /// The event payload.
    pub payload: Value,
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Timestamp when the event was created.
    pub timestamp: DateTime<Utc>,
}

impl Event {
    /// Creates a new event with the given type and payload.
    pub fn new(event_type: EventType, payload: impl Serialize) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            event_type,
            payload: serde_json::to_value(payload).unwrap_or(Value::Null),
            metadata: EventMetadata::default(),
            timestamp: Utc::now(),
        }
    }

    /// Creates a new event from a simple type string (e.g., "webhook.invalid_signature").
    pub fn simple(event_type: impl Into<String>, payload: impl Serialize) -> Self {
        Self::new(EventType::from_string(event_type), payload)
    }

    /// Sets the source in metadata.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.metadata.source = source.into();
        self
    }

    /// Adds a tag to the event metadata.
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.tags.insert(key.into(), value.into());
        self
    }

    /// Returns the simple type string without version (e.g., "webhook.invalid_signature").
    pub fn simple_type_string(&self) -> String {
        self.event_type.simple_string()
    }

    /// Deserializes the payload to a specific type.
    pub fn payload_as<T: for<'de> Deserialize<'de>>(&self) -> Option<T> {
        serde_json::from_value(self.payload.clone()).ok()
    }
}

/// Event type identifier with namespace, name, and version.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct EventType {
    /// Namespace (e.g., "webhook").
    pub namespace: String,
    /// Event name (e.g., "invalid_signature").
    pub name: String,
    /// Schema version for this event type.
    pub version: u32,
}

impl EventType {
    /// Creates a new event type.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            version: 1,
        }
    }

    /// Creates an event type with a specific version.
    pub fn versioned(namespace: impl Into<String>, name: impl Into<String>, version: u32) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            version,
        }
    }

    /// Parses an event type from a string like "webhook.stored" or "webhook.stored.v2".
    pub fn from_string(s: impl Into<String>) -> Self {
        let s = s.into();
        let parts: Vec<&str> = s.split('.').collect();

        match parts.as_slice() {
            [] => Self::new("unknown", "unknown"),
            [name] => Self::new("unknown", *name),
            [namespace, name] => Self::new(*namespace, *name),
            [namespace, rest @ ..] => {
                if let Some((last, middle)) = rest.split_last() {
                    if let Some(version) = last.strip_prefix('v').and_then(|v| v.parse().ok()) {
                        return Self::versioned(*namespace, middle.join("."), version);
                    }
                }
                Self::new(*namespace, rest.join("."))
            }
        }
    }

    /// Returns the simple string without version (e.g., "webhook.invalid_signature").
    pub fn simple_string(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }

    /// Checks if this event type matches a pattern (supports wildcards).
    pub fn matches(&self, pattern: &str) -> bool {
        if pattern == "*" {
            return true;
        }

        let simple = self.simple_string();
        if let Some(prefix) = pattern.strip_suffix(".*") {
            return self.namespace == prefix || simple.starts_with(&format!("{prefix}."));
        }

        simple == pattern || self.to_string() == pattern
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.v{}", self.namespace, self.name, self.version)
    }
}

/// Metadata associated with an event.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EventMetadata {
    /// Component that emitted the event.
    pub source: String,
    /// Custom tags for filtering and routing.
    pub tags: HashMap<String, String>,
}

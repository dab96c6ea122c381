//! Persisted webhook call records and the shapes they are stored in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::request::Headers;

/// An accepted webhook call as stored by the persistence collaborator.
///
/// `payload` and `headers` are fixed at creation. Only `exception` and
/// `updated_at` change afterwards, when a task worker reports an outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookCallRecord {
    /// Identifier assigned by the store.
    pub id: String,
    /// Name of the config the call arrived through.
    pub config_name: String,
    /// Stored payload, `None` when the record shape omits it.
    pub payload: Option<Value>,
    /// Headers retained under the config's header policy.
    pub headers: Headers,
    /// Failure reported by async processing, if any.
    pub exception: Option<RecordedException>,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record was last annotated.
    pub updated_at: DateTime<Utc>,
}

/// A processing failure attached to a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedException {
    /// Human-readable failure message.
    pub message: String,
    /// When the failure was recorded.
    pub recorded_at: DateTime<Utc>,
}

impl RecordedException {
    /// Creates an exception stamped with the current time.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            recorded_at: Utc::now(),
        }
    }
}

/// A record that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewWebhookCall {
    /// Name of the config the call arrived through.
    pub config_name: String,
    /// Payload to store, `None` to omit it.
    pub payload: Option<Value>,
    /// Headers to store.
    pub headers: Headers,
}

/// Decides how an accepted call is laid out before it is persisted.
pub trait RecordModel: Send + Sync {
    /// Identifier of this shape, as used in configuration.
    fn name(&self) -> &str;

    /// Builds the record to persist.
    fn build(&self, config_name: &str, payload: &Value, headers: Headers) -> NewWebhookCall;
}

/// Stores the payload alongside the headers.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebhookCallModel;

impl RecordModel for WebhookCallModel {
    fn name(&self) -> &str {
        "webhook_call"
    }

    fn build(&self, config_name: &str, payload: &Value, headers: Headers) -> NewWebhookCall {
        NewWebhookCall {
            config_name: config_name.to_string(),
            payload: Some(payload.clone()),
            headers,
        }
    }
}

/// Stores the headers only; the payload is never written.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebhookCallWithoutPayloadModel;

impl RecordModel for WebhookCallWithoutPayloadModel {
    fn name(&self) -> &str {
        "webhook_call_without_payload"
    }

    fn build(&self, config_name: &str, _payload: &Value, headers: Headers) -> NewWebhookCall {
        NewWebhookCall {
            config_name: config_name.to_string(),
            payload: None,
            headers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_models() {
        let headers = Headers::from([("signature".to_string(), "abc".to_string())]);
        let payload = json!({"a": 1});

        let full = WebhookCallModel.build("stripe", &payload, headers.clone());
        assert_eq!(full.payload, Some(payload.clone()));
        assert_eq!(full.config_name, "stripe");
        assert_eq!(full.headers, headers);

        let bare = WebhookCallWithoutPayloadModel.build("stripe", &payload, headers.clone());
        assert_eq!(bare.payload, None);
        assert_eq!(bare.headers, headers);
    }
}

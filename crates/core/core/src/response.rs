//! Response strategies for accepted calls.

use serde_json::{Value, json};

use crate::config::WebhookConfig;
use crate::record::WebhookCallRecord;

/// A transport-neutral HTTP response.
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookResponse {
    /// HTTP status code.
    pub status: u16,
    /// Optional JSON body; `None` means an empty body.
    pub body: Option<Value>,
}

impl WebhookResponse {
    /// 200 with an empty body.
    pub fn ok() -> Self {
        Self {
            status: 200,
            body: None,
        }
    }

    /// A response with a JSON body.
    pub fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            body: Some(body),
        }
    }

    /// Returns true for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Builds the success response for a call that passed validation.
///
/// `record` is `None` when the profile skipped the call.
pub trait RespondsTo: Send + Sync {
    /// Produces the response to send back to the sender.
    fn respond(&self, record: Option<&WebhookCallRecord>, config: &WebhookConfig) -> WebhookResponse;
}

/// 200 with an empty body.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyOk;

impl RespondsTo for EmptyOk {
    fn respond(&self, _record: Option<&WebhookCallRecord>, _config: &WebhookConfig) -> WebhookResponse {
        WebhookResponse::ok()
    }
}

/// 200 with `{"message": "ok"}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonOk;

impl RespondsTo for JsonOk {
    fn respond(&self, _record: Option<&WebhookCallRecord>, _config: &WebhookConfig) -> WebhookResponse {
        WebhookResponse::json(200, json!({ "message": "ok" }))
    }
}

/// 202 carrying the stored record id, or `null` when nothing was stored.
#[derive(Debug, Clone, Copy, Default)]
pub struct Accepted;

impl RespondsTo for Accepted {
    fn respond(&self, record: Option<&WebhookCallRecord>, _config: &WebhookConfig) -> WebhookResponse {
        WebhookResponse::json(202, json!({ "id": record.map(|r| r.id.as_str()) }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> WebhookConfig {
        WebhookConfig::builder("stripe").signing_secret("s").build().unwrap()
    }

    #[test]
    fn test_empty_ok() {
        let response = EmptyOk.respond(None, &config());
        assert_eq!(response, WebhookResponse::ok());
        assert!(response.is_success());
        assert!(response.body.is_none());
    }

    #[test]
    fn test_json_ok() {
        let response = JsonOk.respond(None, &config());
        assert_eq!(response.status, 200);
        assert_eq!(response.body, Some(json!({"message": "ok"})));
    }

    #[test]
    fn test_accepted_without_record() {
        let response = Accepted.respond(None, &config());
        assert_eq!(response.status, 202);
        assert_eq!(response.body, Some(json!({"id": null})));
    }
}

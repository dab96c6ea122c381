//! # Webhook Client Axum Integration
//!
//! This crate exposes registered webhook configs over HTTP:
//! - One `POST` route per config, bound at registration time
//! - Conversion of axum requests into [`IncomingWebhook`]
//! - Mapping of pipeline outcomes and errors to responses
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use webhook_client_axum::WebhookRoutes;
//!
//! let app = WebhookRoutes::new(processor)
//!     .route("/webhooks/stripe", "stripe")
//!     .route("/webhooks/github", "github")
//!     .build()?
//!     .into_router();
//!
//! axum::serve(listener, app).await?;
//! ```

mod routes;

pub use routes::{RouteBinding, WebhookRouter, WebhookRoutes};

use axum::body::Bytes;
use axum::response::{IntoResponse, Response};
use http::{HeaderMap, StatusCode};
use webhook_client_core::error::WebhookClientError;
use webhook_client_core::request::IncomingWebhook;
use webhook_client_core::response::WebhookResponse;

/// Converts an axum request into the pipeline's request context.
///
/// Header values that are not valid UTF-8 are kept lossily; the body is kept
/// byte-for-byte.
pub fn to_incoming_webhook(config_name: &str, headers: &HeaderMap, body: Bytes) -> IncomingWebhook {
    let headers = headers.iter().map(|(name, value)| {
        (
            name.as_str().to_string(),
            String::from_utf8_lossy(value.as_bytes()).into_owned(),
        )
    });

    IncomingWebhook::new(config_name, body.to_vec(), headers)
}

/// Converts a pipeline response to an axum response.
pub fn to_axum_response(response: WebhookResponse) -> Response {
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    match response.body {
        Some(body) => (status, axum::Json(body)).into_response(),
        None => status.into_response(),
    }
}

/// Wrapper for WebhookClientError that implements IntoResponse.
///
/// The body only ever carries the generic public message.
pub struct WebhookErrorResponse(pub WebhookClientError);

impl IntoResponse for WebhookErrorResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = serde_json::json!({
            "error": self.0.public_message(),
            "code": status.as_u16()
        });

        (status, axum::Json(body)).into_response()
    }
}

impl From<WebhookClientError> for WebhookErrorResponse {
    fn from(err: WebhookClientError) -> Self {
        WebhookErrorResponse(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;
    use serde_json::json;

    #[test]
    fn test_to_incoming_webhook() {
        let mut headers = HeaderMap::new();
        headers.insert("Signature", HeaderValue::from_static("abc"));
        headers.append("x-tag", HeaderValue::from_static("one"));
        headers.append("x-tag", HeaderValue::from_static("two"));

        let request = to_incoming_webhook("stripe", &headers, Bytes::from_static(br#"{"a":1}"#));

        assert_eq!(request.config_name(), "stripe");
        assert_eq!(request.header("signature"), Some("abc"));
        assert_eq!(request.header("x-tag"), Some("one, two"));
        assert_eq!(request.payload(), &json!({"a": 1}));
    }

    #[test]
    fn test_error_response_is_opaque() {
        let response =
            WebhookErrorResponse(WebhookClientError::signature_invalid("stripe")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_empty_and_json_responses() {
        assert_eq!(to_axum_response(WebhookResponse::ok()).status(), StatusCode::OK);
        assert_eq!(
            to_axum_response(WebhookResponse::json(202, json!({"id": "1"}))).status(),
            StatusCode::ACCEPTED
        );
    }
}

//! Signature validation for inbound calls.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::config::WebhookConfig;
use crate::error::{WebhookClientError, WebhookClientResult};
use crate::request::IncomingWebhook;

type HmacSha256 = Hmac<Sha256>;

/// Decides whether an inbound call is authentic for its config.
///
/// Implementations are pure predicates over the raw request and the config.
pub trait SignatureValidator: Send + Sync {
    /// Returns true when the request carries a valid signature.
    fn is_valid(&self, request: &IncomingWebhook, config: &WebhookConfig) -> bool;

    /// Whether configs using this validator must carry a signing secret.
    fn requires_secret(&self) -> bool {
        false
    }
}

/// Hex-encoded HMAC-SHA256 over the raw body, keyed by the signing secret.
///
/// The expected header value is the bare lower-case hex digest, with no
/// `sha256=` prefix. Surrounding whitespace is ignored; upper-case digits
/// are rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct HmacSha256Validator;

impl SignatureValidator for HmacSha256Validator {
    fn is_valid(&self, request: &IncomingWebhook, config: &WebhookConfig) -> bool {
        let Some(signature) = request.header(config.signature_header_name()) else {
            return false;
        };
        let signature = signature.trim();
        if signature.is_empty() || config.signing_secret().is_empty() {
            return false;
        }

        if !signature.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            return false;
        }
        let Ok(expected) = hex::decode(signature) else {
            return false;
        };

        let Ok(mut mac) = HmacSha256::new_from_slice(config.signing_secret().as_bytes()) else {
            return false;
        };
        mac.update(request.body());

        // verify_slice compares in constant time
        mac.verify_slice(&expected).is_ok()
    }

    fn requires_secret(&self) -> bool {
        true
    }
}

/// Accepts every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysValid;

impl SignatureValidator for AlwaysValid {
    fn is_valid(&self, _request: &IncomingWebhook, _config: &WebhookConfig) -> bool {
        true
    }
}

/// Rejects every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysInvalid;

impl SignatureValidator for AlwaysInvalid {
    fn is_valid(&self, _request: &IncomingWebhook, _config: &WebhookConfig) -> bool {
        false
    }
}

/// Computes the signature a sender would attach to `body`.
pub fn sign_payload(secret: &str, body: &[u8]) -> WebhookClientResult<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|err| WebhookClientError::internal(format!("invalid HMAC key: {err}")))?;
    mac.update(body);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

//! Error types for Webhook Client.
//!
//! [`WebhookClientError`] covers every failure the ingestion pipeline can
//! surface. All of them are fatal to the inbound request and map to a generic
//! server error at the HTTP boundary; a profile skip is an outcome, not an error.

use thiserror::Error;

use crate::storage::StorageError;

/// Body sent to callers for every pipeline failure.
pub const PUBLIC_ERROR_MESSAGE: &str = "Internal Server Error";

/// The main error type for Webhook Client operations.
#[derive(Debug, Error)]
pub enum WebhookClientError {
    // ==================== Configuration Errors ====================
    /// No webhook config is registered under the requested name.
    #[error("Could not find a webhook config named `{name}`")]
    ConfigNotFound { name: String },

    /// A webhook config failed validation.
    #[error("Invalid webhook config `{name}`: {reason}")]
    InvalidConfig { name: String, reason: String },

    /// A capability identifier is not present in the catalog.
    #[error("Unknown {kind} `{id}`")]
    UnknownCapability { kind: &'static str, id: String },

    // ==================== Pipeline Errors ====================
    /// The request did not carry a valid signature for its config.
    #[error("The signature is invalid for webhook config `{config_name}`")]
    SignatureInvalid { config_name: String },

    /// The call record could not be persisted.
    #[error("Failed to store webhook call: {message}")]
    Persistence { message: String },

    /// The process task could not be handed off after the record was stored.
    #[error("Failed to dispatch webhook call `{record_id}`: {message}")]
    Dispatch { record_id: String, message: String },

    // ==================== Internal Errors ====================
    /// Serialization/deserialization failed.
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// An internal error occurred.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl WebhookClientError {
    /// Creates a config-not-found error.
    pub fn config_not_found(name: impl Into<String>) -> Self {
        Self::ConfigNotFound { name: name.into() }
    }

    /// Creates an invalid-config error.
    pub fn invalid_config(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Creates an unknown-capability error.
    pub fn unknown_capability(kind: &'static str, id: impl Into<String>) -> Self {
        Self::UnknownCapability { kind, id: id.into() }
    }

    /// Creates an invalid-signature error.
    pub fn signature_invalid(config_name: impl Into<String>) -> Self {
        Self::SignatureInvalid {
            config_name: config_name.into(),
        }
    }

    /// Creates a persistence error.
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence {
            message: message.into(),
        }
    }

    /// Creates a dispatch error.
    pub fn dispatch(record_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Dispatch {
            record_id: record_id.into(),
            message: message.into(),
        }
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true for errors raised while loading configuration.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidConfig { .. } | Self::UnknownCapability { .. }
        )
    }

    /// Returns the HTTP status code for this error.
    ///
    /// Every failure is reported as a plain server error, including a bad
    /// signature, so callers cannot tell validation apart from storage faults.
    pub fn status_code(&self) -> u16 {
        500
    }

    /// Returns the text that may be shown to the caller.
    pub fn public_message(&self) -> &'static str {
        PUBLIC_ERROR_MESSAGE
    }
}

/// A Result type alias using WebhookClientError.
pub type WebhookClientResult<T> = Result<T, WebhookClientError>;

impl From<serde_json::Error> for WebhookClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<StorageError> for WebhookClientError {
    fn from(err: StorageError) -> Self {
        Self::persistence(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = WebhookClientError::config_not_found("stripe");
        assert_eq!(err.to_string(), "Could not find a webhook config named `stripe`");

        let err = WebhookClientError::unknown_capability("signature validator", "rsa");
        assert_eq!(err.to_string(), "Unknown signature validator `rsa`");
    }

    #[test]
    fn test_every_error_is_an_opaque_server_error() {
        let errors = [
            WebhookClientError::config_not_found("a"),
            WebhookClientError::signature_invalid("a"),
            WebhookClientError::persistence("disk full"),
            WebhookClientError::dispatch("id-1", "queue down"),
        ];

        for err in errors {
            assert_eq!(err.status_code(), 500);
            assert_eq!(err.public_message(), "Internal Server Error");
        }
    }

    #[test]
    fn test_storage_error_becomes_persistence() {
        let err: WebhookClientError = StorageError::backend("connection reset").into();
        assert!(matches!(err, WebhookClientError::Persistence { .. }));
        assert!(!err.is_config_error());
        assert!(WebhookClientError::invalid_config("a", "b").is_config_error());
    }
}

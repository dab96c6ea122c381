use thiserror::Error;

/// Failures raised while delivering notifications.
#[derive(Debug, Error)]
pub enum EventError {
    /// A subscriber returned an error.
    #[error("Handler `{handler}` failed: {message}")]
    HandlerFailed { handler: String, message: String },

    /// A payload could not be converted to or from JSON.
    #[error("Invalid event payload: {0}")]
    Payload(#[from] serde_json::Error),
}

impl EventError {
    pub fn handler_failed(handler: impl Into<String>, message: impl Into<String>) -> Self {
        Self::HandlerFailed {
            handler: handler.into(),
            message: message.into(),
        }
    }
}

//! Persists accepted calls.

use std::sync::Arc;

use crate::config::WebhookConfig;
use crate::error::{WebhookClientError, WebhookClientResult};
use crate::record::WebhookCallRecord;
use crate::request::IncomingWebhook;
use crate::storage::WebhookCallStore;

/// Writes one record per accepted call through the storage collaborator.
#[derive(Clone)]
pub struct CallRecorder {
    store: Arc<dyn WebhookCallStore>,
}

impl CallRecorder {
    pub fn new(store: Arc<dyn WebhookCallStore>) -> Self {
        Self { store }
    }

    /// Filters headers, shapes the record with the config's model and stores it.
    ///
    /// Returns only after the store acknowledged the write.
    pub async fn record(
        &self,
        request: &IncomingWebhook,
        config: &WebhookConfig,
    ) -> WebhookClientResult<WebhookCallRecord> {
        let headers = config.store_headers().filter(request.headers());
        let call = config
            .record_model()
            .build(config.name(), request.payload(), headers);

        self.store.create(call).await.map_err(|err| {
            tracing::error!(config = %config.name(), error = %err, "Failed to store webhook call");
            WebhookClientError::persistence(err.to_string())
        })
    }
}

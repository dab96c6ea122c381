//! Persistence collaborator for webhook call records.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::record::{NewWebhookCall, RecordedException, WebhookCallRecord};

/// Errors raised by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend failed to complete the operation.
    #[error("Storage backend error: {message}")]
    Backend { message: String },

    /// The referenced record does not exist.
    #[error("Webhook call not found: {id}")]
    NotFound { id: String },
}

impl StorageError {
    /// Creates a backend error.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    /// Creates a not-found error.
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for webhook call storage backends.
///
/// A successful `create` must be durable: the returned record is retrievable
/// through `get` from then on.
#[async_trait]
pub trait WebhookCallStore: Send + Sync {
    // ==================== Record Operations ====================

    /// Persists a new call and returns it with its assigned id and timestamps.
    async fn create(&self, call: NewWebhookCall) -> StorageResult<WebhookCallRecord>;

    /// Gets a record by id.
    async fn get(&self, id: &str) -> StorageResult<Option<WebhookCallRecord>>;

    /// Lists the most recent records for a config, newest first.
    async fn list_for_config(
        &self,
        config_name: &str,
        limit: usize,
    ) -> StorageResult<Vec<WebhookCallRecord>>;

    // ==================== Processing Annotations ====================

    /// Attaches a processing failure to a record.
    async fn save_exception(
        &self,
        id: &str,
        exception: RecordedException,
    ) -> StorageResult<WebhookCallRecord>;

    /// Clears a previously recorded processing failure.
    async fn clear_exception(&self, id: &str) -> StorageResult<WebhookCallRecord>;

    // ==================== Retention ====================

    /// Deletes records of `config_name` created before `cutoff`; returns how many were removed.
    async fn prune_older_than(
        &self,
        config_name: &str,
        cutoff: DateTime<Utc>,
    ) -> StorageResult<usize>;
}

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::RwLock;

use webhook_client_core::record::{NewWebhookCall, RecordedException, WebhookCallRecord};
use webhook_client_core::storage::{StorageError, StorageResult, WebhookCallStore};

#[derive(Debug, Clone)]
struct StoredCall {
    sequence: u64,
    record: WebhookCallRecord,
}

/// In-memory webhook call store.
///
/// Data is lost when the process exits. Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryCallStore {
    calls: Arc<RwLock<HashMap<String, StoredCall>>>,
    sequence: Arc<AtomicU64>,
    unavailable: Arc<AtomicBool>,
}

impl MemoryCallStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store behind an `Arc`.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Makes every write fail until switched back.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Returns the number of stored calls.
    pub async fn count(&self) -> usize {
        self.calls.read().await.len()
    }

    /// Returns every stored call, oldest first.
    pub async fn all(&self) -> Vec<WebhookCallRecord> {
        let calls = self.calls.read().await;
        let mut stored: Vec<&StoredCall> = calls.values().collect();
        stored.sort_by_key(|call| call.sequence);
        stored.into_iter().map(|call| call.record.clone()).collect()
    }

    /// Clears all stored data.
    pub async fn clear(&self) {
        self.calls.write().await.clear();
    }

    fn check_available(&self) -> StorageResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StorageError::backend("memory store is unavailable"));
        }
        Ok(())
    }

    async fn annotate(
        &self,
        id: &str,
        exception: Option<RecordedException>,
    ) -> StorageResult<WebhookCallRecord> {
        self.check_available()?;
        let mut calls = self.calls.write().await;
        let call = calls.get_mut(id).ok_or_else(|| StorageError::not_found(id))?;

        call.record.exception = exception;
        call.record.updated_at = Utc::now();
        Ok(call.record.clone())
    }
}

#[async_trait]
impl WebhookCallStore for MemoryCallStore {
    async fn create(&self, call: NewWebhookCall) -> StorageResult<WebhookCallRecord> {
        self.check_available()?;

        let now = Utc::now();
        let record = WebhookCallRecord {
            id: uuid::Uuid::new_v4().to_string(),
            config_name: call.config_name,
            payload: call.payload,
            headers: call.headers,
            exception: None,
            created_at: now,
            updated_at: now,
        };
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst);

        let mut calls = self.calls.write().await;
        calls.insert(
            record.id.clone(),
            StoredCall {
                sequence,
                record: record.clone(),
            },
        );
        Ok(record)
    }

    async fn get(&self, id: &str) -> StorageResult<Option<WebhookCallRecord>> {
        let calls = self.calls.read().await;
        Ok(calls.get(id).map(|call| call.record.clone()))
    }

    async fn list_for_config(
        &self,
        config_name: &str,
        limit: usize,
    ) -> StorageResult<Vec<WebhookCallRecord>> {
        let calls = self.calls.read().await;
        let mut matching: Vec<&StoredCall> = calls
            .values()
            .filter(|call| call.record.config_name == config_name)
            .collect();
        matching.sort_by(|a, b| b.sequence.cmp(&a.sequence));

        Ok(matching
            .into_iter()
            .take(limit)
            .map(|call| call.record.clone())
            .collect())
    }

    async fn save_exception(
        &self,
        id: &str,
        exception: RecordedException,
    ) -> StorageResult<WebhookCallRecord> {
        self.annotate(id, Some(exception)).await
    }

    async fn clear_exception(&self, id: &str) -> StorageResult<WebhookCallRecord> {
        self.annotate(id, None).await
    }

    async fn prune_older_than(
        &self,
        config_name: &str,
        cutoff: DateTime<Utc>,
    ) -> StorageResult<usize> {
        self.check_available()?;
        let mut calls = self.calls.write().await;
        let before = calls.len();
        calls.retain(|_, call| {
            call.record.config_name != config_name || call.record.created_at >= cutoff
        });
        let pruned = before - calls.len();

        if pruned > 0 {
            tracing::debug!(config = config_name, pruned, "Pruned webhook calls");
        }
        Ok(pruned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use webhook_client_core::request::Headers;

    fn call(config_name: &str, payload: serde_json::Value) -> NewWebhookCall {
        NewWebhookCall {
            config_name: config_name.to_string(),
            payload: Some(payload),
            headers: Headers::from([("signature".to_string(), "abc".to_string())]),
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = MemoryCallStore::new();

        let created = store.create(call("stripe", json!({"a": 1}))).await.unwrap();
        assert!(!created.id.is_empty());
        assert_eq!(created.created_at, created.updated_at);
        assert!(created.exception.is_none());

        let fetched = store.get(&created.id).await.unwrap();
        assert_eq!(fetched, Some(created));
        assert!(store.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_for_config_newest_first() {
        let store = MemoryCallStore::new();
        for i in 0..3 {
            store.create(call("stripe", json!({"n": i}))).await.unwrap();
        }
        store.create(call("github", json!({}))).await.unwrap();

        let listed = store.list_for_config("stripe", 2).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].payload, Some(json!({"n": 2})));
        assert_eq!(listed[1].payload, Some(json!({"n": 1})));
        assert_eq!(store.count().await, 4);
    }

    #[tokio::test]
    async fn test_exception_annotation() {
        let store = MemoryCallStore::new();
        let created = store.create(call("stripe", json!({}))).await.unwrap();

        let failed = store
            .save_exception(&created.id, RecordedException::new("boom"))
            .await
            .unwrap();
        assert_eq!(failed.exception.as_ref().unwrap().message, "boom");
        assert!(failed.updated_at >= created.updated_at);
        assert_eq!(failed.payload, created.payload);

        let cleared = store.clear_exception(&created.id).await.unwrap();
        assert!(cleared.exception.is_none());

        let missing = store.clear_exception("missing").await;
        assert!(matches!(missing, Err(StorageError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_prune_only_touches_one_config() {
        let store = MemoryCallStore::new();
        store.create(call("stripe", json!({}))).await.unwrap();
        store.create(call("github", json!({}))).await.unwrap();

        let future = Utc::now() + chrono::Duration::seconds(1);
        assert_eq!(store.prune_older_than("stripe", future).await.unwrap(), 1);
        assert_eq!(store.count().await, 1);

        let past = Utc::now() - chrono::Duration::days(1);
        assert_eq!(store.prune_older_than("github", past).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unavailable_store_rejects_writes() {
        let store = MemoryCallStore::new();
        store.set_unavailable(true);

        let err = store.create(call("stripe", json!({}))).await.unwrap_err();
        assert!(matches!(err, StorageError::Backend { .. }));
        assert_eq!(store.count().await, 0);

        store.set_unavailable(false);
        assert!(store.create(call("stripe", json!({}))).await.is_ok());
    }
}

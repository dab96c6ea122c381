//! The ingestion pipeline.
//!
//! [`WebhookProcessor`] runs one inbound call through config resolution,
//! signature validation, the acceptance profile, persistence, dispatch and the
//! response strategy. Persistence and dispatch are both awaited before a
//! response is produced, in that order.

use std::fmt;
use std::sync::Arc;

use tracing::Instrument;

use crate::config::ConfigRegistry;
use crate::dispatch::Dispatcher;
use crate::error::{WebhookClientError, WebhookClientResult};
use crate::notify::{InvalidSignatureEvent, NoopSink, NotificationSink};
use crate::queue::TaskQueue;
use crate::recorder::CallRecorder;
use crate::request::IncomingWebhook;
use crate::response::WebhookResponse;
use crate::storage::WebhookCallStore;

/// Where a call is in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineStage {
    Received,
    Validating,
    RejectedSignature,
    Validated,
    SkippedByProfile,
    Accepted,
    Persisted,
    Dispatched,
    Responded,
    Failed,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Validating => "validating",
            Self::RejectedSignature => "rejected_signature",
            Self::Validated => "validated",
            Self::SkippedByProfile => "skipped_by_profile",
            Self::Accepted => "accepted",
            Self::Persisted => "persisted",
            Self::Dispatched => "dispatched",
            Self::Responded => "responded",
            Self::Failed => "failed",
        }
    }

    /// Returns true for stages a call never leaves.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::RejectedSignature | Self::SkippedByProfile | Self::Responded | Self::Failed
        )
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a call that reached a success response.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedWebhook {
    /// `Responded` for stored calls, `SkippedByProfile` for dropped ones.
    pub stage: PipelineStage,
    /// Id of the stored record, if one was created.
    pub record_id: Option<String>,
    /// Id of the enqueued task, if one was submitted.
    pub task_id: Option<String>,
    /// Response to send back to the sender.
    pub response: WebhookResponse,
}

/// Runs inbound calls through the pipeline.
///
/// Holds no per-request state; one instance serves every route and request.
pub struct WebhookProcessor {
    registry: Arc<ConfigRegistry>,
    recorder: CallRecorder,
    dispatcher: Dispatcher,
    notifications: Arc<dyn NotificationSink>,
}

impl WebhookProcessor {
    /// Creates a processor that drops notifications.
    pub fn new(
        registry: Arc<ConfigRegistry>,
        store: Arc<dyn WebhookCallStore>,
        queue: Arc<dyn TaskQueue>,
    ) -> Self {
        Self {
            registry,
            recorder: CallRecorder::new(store),
            dispatcher: Dispatcher::new(queue),
            notifications: Arc::new(NoopSink),
        }
    }

    /// Sets the sink that receives invalid-signature notifications.
    pub fn with_notifications(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.notifications = sink;
        self
    }

    pub fn registry(&self) -> &Arc<ConfigRegistry> {
        &self.registry
    }

    /// Processes one inbound call.
    ///
    /// Every error is fatal to the request. A profile skip is returned as a
    /// success with no record.
    pub async fn process(&self, request: IncomingWebhook) -> WebhookClientResult<ProcessedWebhook> {
        let span = tracing::info_span!("webhook", config = %request.config_name());
        self.run(request).instrument(span).await
    }

    async fn run(&self, request: IncomingWebhook) -> WebhookClientResult<ProcessedWebhook> {
        tracing::debug!(stage = %PipelineStage::Received, bytes = request.body().len());

        let config = self
            .registry
            .resolve(request.config_name())
            .await
            .inspect_err(|err| {
                tracing::error!(stage = %PipelineStage::Failed, error = %err, "No webhook config for route");
            })?;
        tracing::debug!(stage = %PipelineStage::Validating);

        if !config.signature_validator().is_valid(&request, &config) {
            tracing::warn!(stage = %PipelineStage::RejectedSignature, "Invalid webhook signature");
            self.notifications
                .invalid_signature(InvalidSignatureEvent::from_request(&request))
                .await;
            return Err(WebhookClientError::signature_invalid(config.name()));
        }
        tracing::debug!(stage = %PipelineStage::Validated);

        if !config.webhook_profile().should_process(&request, &config) {
            tracing::debug!(stage = %PipelineStage::SkippedByProfile);
            return Ok(ProcessedWebhook {
                stage: PipelineStage::SkippedByProfile,
                record_id: None,
                task_id: None,
                response: config.response_strategy().respond(None, &config),
            });
        }
        tracing::debug!(stage = %PipelineStage::Accepted);

        let record = self.recorder.record(&request, &config).await?;
        tracing::debug!(stage = %PipelineStage::Persisted, record_id = %record.id);

        let task = self
            .dispatcher
            .dispatch(config.process_task_ref(), &record)
            .await?;
        tracing::debug!(stage = %PipelineStage::Dispatched, task_id = %task.id);

        let response = config.response_strategy().respond(Some(&record), &config);
        tracing::info!(
            stage = %PipelineStage::Responded,
            record_id = %record.id,
            status = response.status,
            "Webhook call accepted"
        );

        Ok(ProcessedWebhook {
            stage: PipelineStage::Responded,
            record_id: Some(record.id),
            task_id: Some(task.id),
            response,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{StoreHeaders, WebhookConfig};
    use crate::profile::ProcessNothing;
    use crate::queue::{ProcessWebhookTask, QueueError};
    use crate::record::{NewWebhookCall, RecordedException, WebhookCallRecord};
    use crate::response::Accepted;
    use crate::signature::{AlwaysInvalid, AlwaysValid, sign_payload};
    use crate::storage::{StorageError, StorageResult};
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use serde_json::json;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct VecStore {
        records: Mutex<Vec<WebhookCallRecord>>,
        fail: bool,
    }

    #[async_trait]
    impl WebhookCallStore for VecStore {
        async fn create(&self, call: NewWebhookCall) -> StorageResult<WebhookCallRecord> {
            if self.fail {
                return Err(StorageError::backend("disk full"));
            }
            let mut records = self.records.lock().await;
            let now = Utc::now();
            let record = WebhookCallRecord {
                id: format!("rec-{}", records.len() + 1),
                config_name: call.config_name,
                payload: call.payload,
                headers: call.headers,
                exception: None,
                created_at: now,
                updated_at: now,
            };
            records.push(record.clone());
            Ok(record)
        }

        async fn get(&self, id: &str) -> StorageResult<Option<WebhookCallRecord>> {
            Ok(self.records.lock().await.iter().find(|r| r.id == id).cloned())
        }

        async fn list_for_config(&self, name: &str, limit: usize) -> StorageResult<Vec<WebhookCallRecord>> {
            let records = self.records.lock().await;
            Ok(records.iter().rev().filter(|r| r.config_name == name).take(limit).cloned().collect())
        }

        async fn save_exception(&self, id: &str, _e: RecordedException) -> StorageResult<WebhookCallRecord> {
            Err(StorageError::not_found(id))
        }

        async fn clear_exception(&self, id: &str) -> StorageResult<WebhookCallRecord> {
            Err(StorageError::not_found(id))
        }

        async fn prune_older_than(&self, _name: &str, _cutoff: DateTime<Utc>) -> StorageResult<usize> {
            Ok(0)
        }
    }

    #[derive(Default)]
    struct VecQueue {
        tasks: Mutex<Vec<ProcessWebhookTask>>,
        fail: bool,
    }

    #[async_trait]
    impl TaskQueue for VecQueue {
        async fn enqueue(&self, task: ProcessWebhookTask) -> Result<(), QueueError> {
            if self.fail {
                return Err(QueueError("queue unavailable".to_string()));
            }
            self.tasks.lock().await.push(task);
            Ok(())
        }
    }

    #[derive(Default)]
    struct CountingSink {
        events: Mutex<Vec<InvalidSignatureEvent>>,
    }

    #[async_trait]
    impl NotificationSink for CountingSink {
        async fn invalid_signature(&self, event: InvalidSignatureEvent) {
            self.events.lock().await.push(event);
        }
    }

    struct Harness {
        processor: WebhookProcessor,
        store: Arc<VecStore>,
        queue: Arc<VecQueue>,
        sink: Arc<CountingSink>,
    }

    fn harness(configs: Vec<WebhookConfig>, store: VecStore, queue: VecQueue) -> Harness {
        let store = Arc::new(store);
        let queue = Arc::new(queue);
        let sink = Arc::new(CountingSink::default());
        let processor = WebhookProcessor::new(
            Arc::new(ConfigRegistry::from_configs(configs)),
            store.clone(),
            queue.clone(),
        )
        .with_notifications(sink.clone());

        Harness { processor, store, queue, sink }
    }

    fn stripe() -> WebhookConfig {
        WebhookConfig::builder("stripe").signing_secret("abc123").build().unwrap()
    }

    fn signed(config_name: &str, secret: &str, body: &str) -> IncomingWebhook {
        IncomingWebhook::new(
            config_name,
            body,
            [
                ("Signature", sign_payload(secret, body.as_bytes()).unwrap()),
                ("Content-Type", "application/json".to_string()),
            ],
        )
    }

    #[tokio::test]
    async fn test_valid_call_is_stored_and_dispatched() {
        let h = harness(vec![stripe()], VecStore::default(), VecQueue::default());

        let outcome = h.processor.process(signed("stripe", "abc123", r#"{"a":1}"#)).await.unwrap();

        assert_eq!(outcome.stage, PipelineStage::Responded);
        assert_eq!(outcome.response, WebhookResponse::ok());

        let records = h.store.records.lock().await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].payload, Some(json!({"a": 1})));
        assert_eq!(records[0].config_name, "stripe");
        assert_eq!(outcome.record_id.as_deref(), Some(records[0].id.as_str()));

        let tasks = h.queue.tasks.lock().await;
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].record_id, records[0].id);
        assert_eq!(tasks[0].task_ref, "process_webhook");
        assert_eq!(outcome.task_id.as_deref(), Some(tasks[0].id.as_str()));
        assert!(h.sink.events.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_signature_notifies_and_stores_nothing() {
        let h = harness(vec![stripe()], VecStore::default(), VecQueue::default());
        let body = r#"{"a":1}"#;
        let bad = format!("{}invalid", sign_payload("abc123", body.as_bytes()).unwrap());

        let err = h
            .processor
            .process(IncomingWebhook::new("stripe", body, [("Signature", bad)]))
            .await
            .unwrap_err();

        assert!(matches!(err, WebhookClientError::SignatureInvalid { .. }));
        assert_eq!(err.status_code(), 500);
        assert!(h.store.records.lock().await.is_empty());
        assert!(h.queue.tasks.lock().await.is_empty());

        let events = h.sink.events.lock().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].config_name, "stripe");
    }

    #[tokio::test]
    async fn test_unknown_config_fails_closed() {
        let h = harness(vec![stripe()], VecStore::default(), VecQueue::default());

        let err = h.processor.process(signed("github", "abc123", "{}")).await.unwrap_err();

        assert!(matches!(err, WebhookClientError::ConfigNotFound { .. }));
        assert!(h.store.records.lock().await.is_empty());
        assert!(h.sink.events.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_swapped_validators() {
        let open = WebhookConfig::builder("open")
            .signature_validator(Arc::new(AlwaysValid))
            .build()
            .unwrap();
        let closed = WebhookConfig::builder("closed")
            .signing_secret("abc123")
            .signature_validator(Arc::new(AlwaysInvalid))
            .build()
            .unwrap();
        let h = harness(vec![open, closed], VecStore::default(), VecQueue::default());

        let unsigned = IncomingWebhook::new("open", "{}", [("Signature", "whatever")]);
        assert!(h.processor.process(unsigned).await.is_ok());

        assert!(h.processor.process(signed("closed", "abc123", "{}")).await.is_err());

        let records = h.store.records.lock().await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].config_name, "open");
    }

    #[tokio::test]
    async fn test_profile_skip_responds_without_storing() {
        let config = WebhookConfig::builder("stripe")
            .signing_secret("abc123")
            .webhook_profile(Arc::new(ProcessNothing))
            .response_strategy(Arc::new(Accepted))
            .build()
            .unwrap();
        let h = harness(vec![config], VecStore::default(), VecQueue::default());

        let outcome = h.processor.process(signed("stripe", "abc123", "{}")).await.unwrap();

        assert_eq!(outcome.stage, PipelineStage::SkippedByProfile);
        assert_eq!(outcome.record_id, None);
        assert_eq!(outcome.response.status, 202);
        assert_eq!(outcome.response.body, Some(json!({"id": null})));
        assert!(h.store.records.lock().await.is_empty());
        assert!(h.queue.tasks.lock().await.is_empty());
        assert!(h.sink.events.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_persistence_failure_skips_dispatch() {
        let store = VecStore {
            fail: true,
            ..Default::default()
        };
        let h = harness(vec![stripe()], store, VecQueue::default());

        let err = h.processor.process(signed("stripe", "abc123", "{}")).await.unwrap_err();

        assert!(matches!(err, WebhookClientError::Persistence { .. }));
        assert!(h.queue.tasks.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_failure_keeps_record() {
        let queue = VecQueue {
            fail: true,
            ..Default::default()
        };
        let h = harness(vec![stripe()], VecStore::default(), queue);

        let err = h.processor.process(signed("stripe", "abc123", r#"{"a":1}"#)).await.unwrap_err();

        let records = h.store.records.lock().await;
        assert_eq!(records.len(), 1);
        match err {
            WebhookClientError::Dispatch { record_id, .. } => assert_eq!(record_id, records[0].id),
            other => panic!("expected dispatch error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_header_policy_is_applied() {
        let config = WebhookConfig::builder("stripe")
            .signing_secret("abc123")
            .store_headers(StoreHeaders::only(["Signature"]))
            .build()
            .unwrap();
        let h = harness(vec![config], VecStore::default(), VecQueue::default());

        h.processor.process(signed("stripe", "abc123", "{}")).await.unwrap();

        let records = h.store.records.lock().await;
        assert_eq!(records[0].headers.len(), 1);
        assert!(records[0].headers.contains_key("signature"));
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(PipelineStage::RejectedSignature.to_string(), "rejected_signature");
        assert!(PipelineStage::Responded.is_terminal());
        assert!(!PipelineStage::Persisted.is_terminal());
    }
}

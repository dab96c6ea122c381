//! Background jobs: the task worker and the retention sweep.

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::HashMap;
use std::sync::Arc;

use webhook_client_adapter_memory::InMemoryTaskQueue;
use webhook_client_core::config::ConfigRegistry;
use webhook_client_core::queue::{ProcessWebhookTask, TaskHandler};
use webhook_client_core::record::{RecordedException, WebhookCallRecord};
use webhook_client_core::storage::{StorageResult, WebhookCallStore};
use webhook_client_events::{Event, EventBus, webhook_events};

/// Handler for `process_webhook` that only logs the call.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingTaskHandler;

#[async_trait]
impl TaskHandler for LoggingTaskHandler {
    fn task_ref(&self) -> &str {
        webhook_client_core::config::DEFAULT_PROCESS_TASK
    }

    async fn handle(&self, record: &WebhookCallRecord) -> Result<(), String> {
        tracing::info!(
            record_id = %record.id,
            config = %record.config_name,
            headers = record.headers.len(),
            "Processing webhook call"
        );
        Ok(())
    }
}

/// How a task ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Succeeded,
    Failed(String),
    /// The record no longer exists, e.g. it was pruned.
    RecordMissing,
}

/// Drains the task queue and runs the matching handler for each task.
pub struct TaskWorker {
    store: Arc<dyn WebhookCallStore>,
    queue: Arc<InMemoryTaskQueue>,
    handlers: HashMap<String, Arc<dyn TaskHandler>>,
    events: Arc<EventBus>,
}

impl TaskWorker {
    pub fn new(
        store: Arc<dyn WebhookCallStore>,
        queue: Arc<InMemoryTaskQueue>,
        events: Arc<EventBus>,
    ) -> Self {
        Self {
            store,
            queue,
            handlers: HashMap::new(),
            events,
        }
    }

    /// Registers a handler under its task reference, replacing any previous one.
    pub fn with_handler(mut self, handler: Arc<dyn TaskHandler>) -> Self {
        self.handlers.insert(handler.task_ref().to_string(), handler);
        self
    }

    /// Runs until the process exits.
    pub async fn run(self) {
        tracing::info!(handlers = self.handlers.len(), "Task worker started");
        loop {
            let task = self.queue.next().await;
            if let Err(err) = self.process(&task).await {
                tracing::error!(task_id = %task.id, error = %err, "Failed to annotate webhook call");
            }
        }
    }

    /// Processes one task and records the outcome on its record.
    pub async fn process(&self, task: &ProcessWebhookTask) -> StorageResult<TaskOutcome> {
        let Some(record) = self.store.get(&task.record_id).await? else {
            tracing::warn!(task_id = %task.id, record_id = %task.record_id, "Webhook call no longer exists");
            return Ok(TaskOutcome::RecordMissing);
        };

        if record.exception.is_some() {
            self.store.clear_exception(&record.id).await?;
        }

        let result = match self.handlers.get(&task.task_ref) {
            Some(handler) => handler.handle(&record).await,
            None => Err(format!("No handler registered for task `{}`", task.task_ref)),
        };

        match result {
            Ok(()) => {
                tracing::debug!(task_id = %task.id, record_id = %record.id, "Webhook call processed");
                Ok(TaskOutcome::Succeeded)
            }
            Err(message) => {
                tracing::error!(task_id = %task.id, record_id = %record.id, error = %message, "Webhook call processing failed");
                self.store
                    .save_exception(&record.id, RecordedException::new(&message))
                    .await?;
                self.events
                    .emit(
                        Event::simple(
                            webhook_events::PROCESSING_FAILED,
                            serde_json::json!({
                                "record_id": record.id,
                                "config_name": record.config_name,
                                "task_ref": task.task_ref,
                                "error": message,
                            }),
                        )
                        .with_source(record.config_name.clone())
                        .with_tag("task_ref", task.task_ref.clone()),
                    )
                    .await;
                Ok(TaskOutcome::Failed(message))
            }
        }
    }
}

/// Deletes calls older than each config's retention. Returns the number removed.
pub async fn prune_once(registry: &ConfigRegistry, store: &dyn WebhookCallStore) -> usize {
    let mut pruned = 0;
    for config in registry.all().await {
        let Some(cutoff) = retention_cutoff(Utc::now(), config.delete_after_days()) else {
            tracing::warn!(
                config = %config.name(),
                delete_after_days = config.delete_after_days(),
                "Retention is out of range, skipping prune"
            );
            continue;
        };
        match store.prune_older_than(config.name(), cutoff).await {
            Ok(count) => pruned += count,
            Err(err) => {
                tracing::error!(config = %config.name(), error = %err, "Failed to prune webhook calls");
            }
        }
    }
    pruned
}

/// The instant before which calls are deleted, or `None` when `days` reaches
/// past the earliest representable date.
fn retention_cutoff(now: DateTime<Utc>, days: u32) -> Option<DateTime<Utc>> {
    TimeDelta::try_days(i64::from(days)).and_then(|retention| now.checked_sub_signed(retention))
}

/// Runs [`prune_once`] every `interval`.
pub async fn run_pruner(
    registry: Arc<ConfigRegistry>,
    store: Arc<dyn WebhookCallStore>,
    interval: std::time::Duration,
) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        let pruned = prune_once(&registry, store.as_ref()).await;
        if pruned > 0 {
            tracing::info!(pruned, "Pruned old webhook calls");
        }
    }
}

//! Async task engine collaborator.
//!
//! The pipeline hands off a [`ProcessWebhookTask`] that references a stored
//! record by id. Executing the task, retrying it and backing off all belong to
//! the engine behind [`TaskQueue`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::record::WebhookCallRecord;

/// Error type for queue operations.
#[derive(Debug, Clone, Error)]
#[error("Queue error: {0}")]
pub struct QueueError(pub String);

/// A unit of asynchronous work for one stored webhook call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessWebhookTask {
    /// Unique task id.
    pub id: String,
    /// Which task type should run.
    pub task_ref: String,
    /// Id of the stored record to process.
    pub record_id: String,
    /// Config the record belongs to.
    pub config_name: String,
    /// When the task was handed off.
    pub enqueued_at: DateTime<Utc>,
}

impl ProcessWebhookTask {
    /// Creates a task for a stored record.
    pub fn new(task_ref: impl Into<String>, record: &WebhookCallRecord) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            task_ref: task_ref.into(),
            record_id: record.id.clone(),
            config_name: record.config_name.clone(),
            enqueued_at: Utc::now(),
        }
    }
}

/// Trait for task queues that accept process tasks.
#[async_trait]
pub trait TaskQueue: Send + Sync {
    /// Submits a task. Returns once the queue has durably accepted it.
    async fn enqueue(&self, task: ProcessWebhookTask) -> Result<(), QueueError>;
}

/// Business logic run by a task worker for one stored call.
#[async_trait]
pub trait TaskHandler: Send + Sync {
    /// Task reference this handler serves.
    fn task_ref(&self) -> &str;

    /// Processes a stored call. An error is recorded on the call.
    async fn handle(&self, record: &WebhookCallRecord) -> Result<(), String>;
}

//! Hands stored calls off to the task engine.

use std::sync::Arc;

use crate::error::{WebhookClientError, WebhookClientResult};
use crate::queue::{ProcessWebhookTask, TaskQueue};
use crate::record::WebhookCallRecord;

/// Enqueues one process task per stored call.
///
/// A failed enqueue leaves the record in place. Nothing here retries.
#[derive(Clone)]
pub struct Dispatcher {
    queue: Arc<dyn TaskQueue>,
}

impl Dispatcher {
    pub fn new(queue: Arc<dyn TaskQueue>) -> Self {
        Self { queue }
    }

    /// Enqueues `task_ref` for `record` and returns the submitted task.
    pub async fn dispatch(
        &self,
        task_ref: &str,
        record: &WebhookCallRecord,
    ) -> WebhookClientResult<ProcessWebhookTask> {
        let task = ProcessWebhookTask::new(task_ref, record);

        self.queue.enqueue(task.clone()).await.map_err(|err| {
            tracing::error!(
                record_id = %record.id,
                task_ref,
                error = %err,
                "Failed to dispatch webhook call, record kept"
            );
            WebhookClientError::dispatch(&record.id, err.to_string())
        })?;

        Ok(task)
    }
}

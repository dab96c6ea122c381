use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Notify, RwLock};

use webhook_client_core::queue::{ProcessWebhookTask, QueueError, TaskQueue};

/// In-memory FIFO task queue.
///
/// Accepted tasks wait here until a worker dequeues them. Nothing is retried
/// or persisted.
#[derive(Debug, Default)]
pub struct InMemoryTaskQueue {
    tasks: RwLock<VecDeque<ProcessWebhookTask>>,
    ready: Notify,
    unavailable: AtomicBool,
}

impl InMemoryTaskQueue {
    /// Creates a new in-memory queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a shared in-memory queue.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Makes every enqueue fail until switched back.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Takes the oldest pending task.
    pub async fn dequeue(&self) -> Option<ProcessWebhookTask> {
        self.tasks.write().await.pop_front()
    }

    /// Waits for a task and takes it.
    pub async fn next(&self) -> ProcessWebhookTask {
        loop {
            if let Some(task) = self.dequeue().await {
                return task;
            }
            self.ready.notified().await;
        }
    }

    /// Returns all pending tasks, oldest first.
    pub async fn pending(&self) -> Vec<ProcessWebhookTask> {
        self.tasks.read().await.iter().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tasks.read().await.is_empty()
    }
}

#[async_trait]
impl TaskQueue for InMemoryTaskQueue {
    async fn enqueue(&self, task: ProcessWebhookTask) -> Result<(), QueueError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(QueueError("memory queue is unavailable".to_string()));
        }

        self.tasks.write().await.push_back(task);
        self.ready.notify_one();
        Ok(())
    }
}

//! # Webhook Client Memory Adapter
//!
//! In-memory stand-ins for the persistence engine and the task engine,
//! primarily intended for testing and development.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use webhook_client_adapter_memory::{InMemoryTaskQueue, MemoryCallStore};
//!
//! let store = MemoryCallStore::shared();
//! let queue = InMemoryTaskQueue::shared();
//! let processor = WebhookProcessor::new(registry, store.clone(), queue.clone());
//! ```

mod queue;
mod store;

pub use queue::InMemoryTaskQueue;
pub use store::MemoryCallStore;

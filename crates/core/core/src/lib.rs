//! # Webhook Client Core
//!
//! The verification and dispatch pipeline for inbound webhooks. This crate
//! defines the per-source configuration, the pluggable capabilities (signature
//! validators, acceptance profiles, record models, response strategies), the
//! collaborator traits for storage and task queues, and the processor that
//! wires them together.
//!
//! HTTP framing lives in integration crates; storage and queue engines live in
//! adapter crates.

pub mod catalog;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod notify;
pub mod processor;
pub mod profile;
pub mod queue;
pub mod record;
pub mod recorder;
pub mod request;
pub mod response;
pub mod settings;
pub mod signature;
pub mod storage;

// Re-export commonly used items at the crate root
pub use catalog::CapabilityCatalog;
pub use config::{ConfigRegistry, StoreHeaders, WebhookConfig, WebhookConfigBuilder};
pub use dispatch::Dispatcher;
pub use error::{WebhookClientError, WebhookClientResult};
pub use notify::{InvalidSignatureEvent, NoopSink, NotificationSink};
pub use processor::{PipelineStage, ProcessedWebhook, WebhookProcessor};
pub use profile::{FnProfile, ProcessEverything, ProcessNothing, WebhookProfile};
pub use queue::{ProcessWebhookTask, QueueError, TaskHandler, TaskQueue};
pub use record::{
    NewWebhookCall, RecordModel, RecordedException, WebhookCallModel, WebhookCallRecord,
    WebhookCallWithoutPayloadModel,
};
pub use recorder::CallRecorder;
pub use request::{Headers, IncomingWebhook};
pub use response::{Accepted, EmptyOk, JsonOk, RespondsTo, WebhookResponse};
pub use settings::{ServerSettings, StoreHeadersSetting, WebhookClientSettings, WebhookSettings};
pub use signature::{
    AlwaysInvalid, AlwaysValid, HmacSha256Validator, SignatureValidator, sign_payload,
};
pub use storage::{StorageError, StorageResult, WebhookCallStore};

// Re-export event types from the events crate
pub use webhook_client_events as events;
pub use webhook_client_events::{Event, EventBus, EventHandler, EventType, webhook_events};

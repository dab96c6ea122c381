//! Capability lookup table.
//!
//! Configuration names capabilities by identifier. The catalog maps each
//! identifier to a constructor once, at load time, so nothing is looked up by
//! name while requests are served.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use crate::config::DEFAULT_PROCESS_TASK;
use crate::error::{WebhookClientError, WebhookClientResult};
use crate::profile::{ProcessEverything, ProcessNothing, WebhookProfile};
use crate::record::{RecordModel, WebhookCallModel, WebhookCallWithoutPayloadModel};
use crate::response::{Accepted, EmptyOk, JsonOk, RespondsTo};
use crate::signature::{AlwaysInvalid, AlwaysValid, HmacSha256Validator, SignatureValidator};

type Constructor<T> = Arc<dyn Fn() -> T + Send + Sync>;

/// Identifiers of the built-in capabilities.
pub mod builtin {
    pub const HMAC_SHA256: &str = "hmac_sha256";
    pub const ALWAYS_VALID: &str = "always_valid";
    pub const ALWAYS_INVALID: &str = "always_invalid";

    pub const PROCESS_EVERYTHING: &str = "process_everything";
    pub const PROCESS_NOTHING: &str = "process_nothing";

    pub const EMPTY_OK: &str = "empty_ok";
    pub const JSON_OK: &str = "json_ok";
    pub const ACCEPTED: &str = "accepted";

    pub const WEBHOOK_CALL: &str = "webhook_call";
    pub const WEBHOOK_CALL_WITHOUT_PAYLOAD: &str = "webhook_call_without_payload";
}

/// Maps capability identifiers to constructors.
#[derive(Clone)]
pub struct CapabilityCatalog {
    validators: HashMap<String, Constructor<Arc<dyn SignatureValidator>>>,
    profiles: HashMap<String, Constructor<Arc<dyn WebhookProfile>>>,
    responses: HashMap<String, Constructor<Arc<dyn RespondsTo>>>,
    models: HashMap<String, Constructor<Arc<dyn RecordModel>>>,
    task_refs: BTreeSet<String>,
}

impl CapabilityCatalog {
    /// Creates a catalog with no entries.
    pub fn empty() -> Self {
        Self {
            validators: HashMap::new(),
            profiles: HashMap::new(),
            responses: HashMap::new(),
            models: HashMap::new(),
            task_refs: BTreeSet::new(),
        }
    }

    /// Creates a catalog holding the built-in capabilities.
    pub fn new() -> Self {
        Self::empty()
            .with_validator(builtin::HMAC_SHA256, || Arc::new(HmacSha256Validator))
            .with_validator(builtin::ALWAYS_VALID, || Arc::new(AlwaysValid))
            .with_validator(builtin::ALWAYS_INVALID, || Arc::new(AlwaysInvalid))
            .with_profile(builtin::PROCESS_EVERYTHING, || Arc::new(ProcessEverything))
            .with_profile(builtin::PROCESS_NOTHING, || Arc::new(ProcessNothing))
            .with_response(builtin::EMPTY_OK, || Arc::new(EmptyOk))
            .with_response(builtin::JSON_OK, || Arc::new(JsonOk))
            .with_response(builtin::ACCEPTED, || Arc::new(Accepted))
            .with_model(builtin::WEBHOOK_CALL, || Arc::new(WebhookCallModel))
            .with_model(builtin::WEBHOOK_CALL_WITHOUT_PAYLOAD, || {
                Arc::new(WebhookCallWithoutPayloadModel)
            })
            .with_task(DEFAULT_PROCESS_TASK)
    }

    // ==================== Registration ====================

    pub fn with_validator<F>(mut self, id: impl Into<String>, constructor: F) -> Self
    where
        F: Fn() -> Arc<dyn SignatureValidator> + Send + Sync + 'static,
    {
        self.validators.insert(id.into(), Arc::new(constructor));
        self
    }

    pub fn with_profile<F>(mut self, id: impl Into<String>, constructor: F) -> Self
    where
        F: Fn() -> Arc<dyn WebhookProfile> + Send + Sync + 'static,
    {
        self.profiles.insert(id.into(), Arc::new(constructor));
        self
    }

    pub fn with_response<F>(mut self, id: impl Into<String>, constructor: F) -> Self
    where
        F: Fn() -> Arc<dyn RespondsTo> + Send + Sync + 'static,
    {
        self.responses.insert(id.into(), Arc::new(constructor));
        self
    }

    pub fn with_model<F>(mut self, id: impl Into<String>, constructor: F) -> Self
    where
        F: Fn() -> Arc<dyn RecordModel> + Send + Sync + 'static,
    {
        self.models.insert(id.into(), Arc::new(constructor));
        self
    }

    /// Declares a task reference the task engine knows how to run.
    pub fn with_task(mut self, task_ref: impl Into<String>) -> Self {
        self.task_refs.insert(task_ref.into());
        self
    }

    // ==================== Lookup ====================

    pub fn validator(&self, id: &str) -> WebhookClientResult<Arc<dyn SignatureValidator>> {
        construct(&self.validators, "signature validator", id)
    }

    pub fn profile(&self, id: &str) -> WebhookClientResult<Arc<dyn WebhookProfile>> {
        construct(&self.profiles, "webhook profile", id)
    }

    pub fn response(&self, id: &str) -> WebhookClientResult<Arc<dyn RespondsTo>> {
        construct(&self.responses, "response strategy", id)
    }

    pub fn model(&self, id: &str) -> WebhookClientResult<Arc<dyn RecordModel>> {
        construct(&self.models, "record model", id)
    }

    /// Checks that a task reference was declared.
    pub fn task(&self, task_ref: &str) -> WebhookClientResult<String> {
        if self.task_refs.contains(task_ref) {
            Ok(task_ref.to_string())
        } else {
            Err(WebhookClientError::unknown_capability("process task", task_ref))
        }
    }

    /// Declared task references, sorted.
    pub fn task_refs(&self) -> impl Iterator<Item = &str> {
        self.task_refs.iter().map(String::as_str)
    }
}

impl Default for CapabilityCatalog {
    fn default() -> Self {
        Self::new()
    }
}

fn construct<T>(
    table: &HashMap<String, Constructor<T>>,
    kind: &'static str,
    id: &str,
) -> WebhookClientResult<T> {
    table
        .get(id)
        .map(|constructor| constructor())
        .ok_or_else(|| WebhookClientError::unknown_capability(kind, id))
}

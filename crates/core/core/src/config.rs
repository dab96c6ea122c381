//! Named webhook configurations and the registry that resolves them.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::error::{WebhookClientError, WebhookClientResult};
use crate::profile::{ProcessEverything, WebhookProfile};
use crate::record::{RecordModel, WebhookCallModel};
use crate::request::Headers;
use crate::response::{EmptyOk, RespondsTo};
use crate::signature::{HmacSha256Validator, SignatureValidator};

/// Default header carrying the signature.
pub const DEFAULT_SIGNATURE_HEADER: &str = "Signature";

/// Default task reference handed to the task engine.
pub const DEFAULT_PROCESS_TASK: &str = "process_webhook";

/// Default retention for stored calls.
pub const DEFAULT_DELETE_AFTER_DAYS: u32 = 30;

/// Which inbound headers are kept on a stored call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StoreHeaders {
    /// Keep every header.
    #[default]
    All,
    /// Keep no headers.
    None,
    /// Keep only the listed headers. Names are stored lower-cased.
    Only(BTreeSet<String>),
}

impl StoreHeaders {
    /// Builds an explicit header list.
    pub fn only<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::Only(
            names
                .into_iter()
                .map(|name| name.as_ref().trim().to_ascii_lowercase())
                .filter(|name| !name.is_empty())
                .collect(),
        )
    }

    /// Applies the policy to a header mapping.
    pub fn filter(&self, headers: &Headers) -> Headers {
        match self {
            Self::All => headers.clone(),
            Self::None => Headers::new(),
            Self::Only(names) => headers
                .iter()
                .filter(|(name, _)| names.contains(&name.to_ascii_lowercase()))
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
        }
    }
}

/// One named webhook source.
///
/// Built through [`WebhookConfig::builder`], which validates the combination
/// of options once. Capabilities are shared trait objects so a config can be
/// cloned cheaply into the registry.
#[derive(Clone)]
pub struct WebhookConfig {
    name: String,
    signing_secret: String,
    signature_header_name: String,
    signature_validator: Arc<dyn SignatureValidator>,
    webhook_profile: Arc<dyn WebhookProfile>,
    store_headers: StoreHeaders,
    process_task_ref: String,
    record_model: Arc<dyn RecordModel>,
    response_strategy: Arc<dyn RespondsTo>,
    delete_after_days: u32,
}

impl WebhookConfig {
    /// Starts building a config with the given name.
    pub fn builder(name: impl Into<String>) -> WebhookConfigBuilder {
        WebhookConfigBuilder::new(name)
    }

    /// Unique name of this config.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Secret used to verify signatures.
    pub fn signing_secret(&self) -> &str {
        &self.signing_secret
    }

    /// Header carrying the signature.
    pub fn signature_header_name(&self) -> &str {
        &self.signature_header_name
    }

    pub fn signature_validator(&self) -> &dyn SignatureValidator {
        self.signature_validator.as_ref()
    }

    pub fn webhook_profile(&self) -> &dyn WebhookProfile {
        self.webhook_profile.as_ref()
    }

    pub fn store_headers(&self) -> &StoreHeaders {
        &self.store_headers
    }

    /// Task reference enqueued for accepted calls.
    pub fn process_task_ref(&self) -> &str {
        &self.process_task_ref
    }

    pub fn record_model(&self) -> &dyn RecordModel {
        self.record_model.as_ref()
    }

    pub fn response_strategy(&self) -> &dyn RespondsTo {
        self.response_strategy.as_ref()
    }

    /// Days a stored call is kept before pruning.
    pub fn delete_after_days(&self) -> u32 {
        self.delete_after_days
    }
}

impl fmt::Debug for WebhookConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookConfig")
            .field("name", &self.name)
            .field("signing_secret", &"<redacted>")
            .field("signature_header_name", &self.signature_header_name)
            .field("store_headers", &self.store_headers)
            .field("process_task_ref", &self.process_task_ref)
            .field("record_model", &self.record_model.name())
            .field("delete_after_days", &self.delete_after_days)
            .finish_non_exhaustive()
    }
}

/// Builder for [`WebhookConfig`].
pub struct WebhookConfigBuilder {
    config: WebhookConfig,
}

impl WebhookConfigBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            config: WebhookConfig {
                name: name.into(),
                signing_secret: String::new(),
                signature_header_name: DEFAULT_SIGNATURE_HEADER.to_string(),
                signature_validator: Arc::new(HmacSha256Validator),
                webhook_profile: Arc::new(ProcessEverything),
                store_headers: StoreHeaders::default(),
                process_task_ref: DEFAULT_PROCESS_TASK.to_string(),
                record_model: Arc::new(WebhookCallModel),
                response_strategy: Arc::new(EmptyOk),
                delete_after_days: DEFAULT_DELETE_AFTER_DAYS,
            },
        }
    }

    pub fn signing_secret(mut self, secret: impl Into<String>) -> Self {
        self.config.signing_secret = secret.into();
        self
    }

    pub fn signature_header_name(mut self, name: impl Into<String>) -> Self {
        self.config.signature_header_name = name.into();
        self
    }

    pub fn signature_validator(mut self, validator: Arc<dyn SignatureValidator>) -> Self {
        self.config.signature_validator = validator;
        self
    }

    pub fn webhook_profile(mut self, profile: Arc<dyn WebhookProfile>) -> Self {
        self.config.webhook_profile = profile;
        self
    }

    pub fn store_headers(mut self, policy: StoreHeaders) -> Self {
        self.config.store_headers = policy;
        self
    }

    pub fn process_task_ref(mut self, task_ref: impl Into<String>) -> Self {
        self.config.process_task_ref = task_ref.into();
        self
    }

    pub fn record_model(mut self, model: Arc<dyn RecordModel>) -> Self {
        self.config.record_model = model;
        self
    }

    pub fn response_strategy(mut self, strategy: Arc<dyn RespondsTo>) -> Self {
        self.config.response_strategy = strategy;
        self
    }

    pub fn delete_after_days(mut self, days: u32) -> Self {
        self.config.delete_after_days = days;
        self
    }

    /// Validates and returns the config.
    pub fn build(self) -> WebhookClientResult<WebhookConfig> {
        let config = self.config;

        if config.name.trim().is_empty() {
            return Err(WebhookClientError::invalid_config(
                config.name,
                "name must not be empty",
            ));
        }
        if config.signature_header_name.trim().is_empty() {
            return Err(WebhookClientError::invalid_config(
                config.name,
                "signature_header_name must not be empty",
            ));
        }
        if config.signature_validator.requires_secret() && config.signing_secret.is_empty() {
            return Err(WebhookClientError::invalid_config(
                config.name,
                "signing_secret must not be empty for this signature validator",
            ));
        }
        if config.process_task_ref.trim().is_empty() {
            return Err(WebhookClientError::invalid_config(
                config.name,
                "process_task_ref must not be empty",
            ));
        }

        Ok(config)
    }
}

/// Holds every config known to the process, keyed by name.
///
/// Read-mostly: lookups take a shared read lock, `register` takes the write
/// lock briefly to swap one entry.
#[derive(Debug, Default)]
pub struct ConfigRegistry {
    configs: RwLock<HashMap<String, Arc<WebhookConfig>>>,
}

impl ConfigRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry from a list of configs. Later entries replace earlier ones.
    pub fn from_configs(configs: impl IntoIterator<Item = WebhookConfig>) -> Self {
        let configs = configs
            .into_iter()
            .map(|config| (config.name().to_string(), Arc::new(config)))
            .collect();
        Self {
            configs: RwLock::new(configs),
        }
    }

    /// Adds a config, replacing any config with the same name.
    pub async fn register(&self, config: WebhookConfig) {
        let name = config.name().to_string();
        let replaced = self
            .configs
            .write()
            .await
            .insert(name.clone(), Arc::new(config))
            .is_some();
        tracing::debug!(config = %name, replaced, "Registered webhook config");
    }

    /// Looks up a config by exact name.
    pub async fn resolve(&self, name: &str) -> WebhookClientResult<Arc<WebhookConfig>> {
        self.configs
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| WebhookClientError::config_not_found(name))
    }

    /// Names of all registered configs, sorted.
    pub async fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.configs.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    /// Snapshot of all registered configs.
    pub async fn all(&self) -> Vec<Arc<WebhookConfig>> {
        self.configs.read().await.values().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.configs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.configs.read().await.is_empty()
    }
}

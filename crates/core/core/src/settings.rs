//! File-based settings.
//!
//! Settings are plain data deserialized from TOML. They become
//! [`WebhookConfig`]s through a [`CapabilityCatalog`], which is where
//! identifiers are checked and header policies are fixed.
//!
//! ```toml
//! [server]
//! port = 8080
//!
//! [[webhooks]]
//! name = "stripe"
//! signing_secret = "whsec_..."
//! store_headers = ["Signature", "User-Agent"]
//! response_strategy = "json_ok"
//! ```

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::{CapabilityCatalog, builtin};
use crate::config::{
    DEFAULT_DELETE_AFTER_DAYS, DEFAULT_PROCESS_TASK, DEFAULT_SIGNATURE_HEADER, StoreHeaders,
    WebhookConfig,
};
use crate::error::{WebhookClientError, WebhookClientResult};

/// Top-level settings document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhookClientSettings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub webhooks: Vec<WebhookSettings>,
}

impl WebhookClientSettings {
    /// Parses settings from a TOML document.
    pub fn from_toml_str(source: &str) -> WebhookClientResult<Self> {
        toml::from_str(source).map_err(|err| WebhookClientError::Serialization {
            message: err.to_string(),
        })
    }

    /// Builds every webhook config, rejecting duplicate names.
    pub fn build_configs(
        &self,
        catalog: &CapabilityCatalog,
    ) -> WebhookClientResult<Vec<WebhookConfig>> {
        let mut seen = HashSet::new();
        self.webhooks
            .iter()
            .map(|webhook| {
                if !seen.insert(webhook.name.as_str()) {
                    return Err(WebhookClientError::invalid_config(
                        &webhook.name,
                        "a webhook config with this name already exists",
                    ));
                }
                webhook.build_config(catalog)
            })
            .collect()
    }
}

/// HTTP server and background job settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    /// Always append a random token to route names.
    pub add_unique_token_to_route_name: bool,
    /// Seconds between retention sweeps; 0 disables pruning.
    pub prune_interval_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            log_level: "info".to_string(),
            add_unique_token_to_route_name: false,
            prune_interval_secs: 3600,
        }
    }
}

impl ServerSettings {
    /// Socket address string to bind.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Header policy as written in a settings file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoreHeadersSetting {
    /// `"ALL"`, `"*"` or `"NONE"`.
    Keyword(String),
    /// Explicit header names.
    List(Vec<String>),
}

impl Default for StoreHeadersSetting {
    fn default() -> Self {
        Self::Keyword("ALL".to_string())
    }
}

impl StoreHeadersSetting {
    /// Converts to the policy used at record time.
    pub fn to_policy(&self, config_name: &str) -> WebhookClientResult<StoreHeaders> {
        match self {
            Self::Keyword(keyword) => match keyword.trim().to_ascii_uppercase().as_str() {
                "ALL" | "*" => Ok(StoreHeaders::All),
                "NONE" => Ok(StoreHeaders::None),
                other => Err(WebhookClientError::invalid_config(
                    config_name,
                    format!("store_headers must be \"ALL\", \"NONE\" or a list, got `{other}`"),
                )),
            },
            Self::List(names) if names.is_empty() => Ok(StoreHeaders::None),
            Self::List(names) => Ok(StoreHeaders::only(names)),
        }
    }
}

/// One `[[webhooks]]` entry.
#[derive(Clone, Serialize, Deserialize)]
pub struct WebhookSettings {
    pub name: String,
    #[serde(default)]
    pub signing_secret: String,
    #[serde(default = "default_signature_header")]
    pub signature_header_name: String,
    #[serde(default = "default_validator")]
    pub signature_validator: String,
    #[serde(default = "default_profile")]
    pub webhook_profile: String,
    #[serde(default)]
    pub store_headers: StoreHeadersSetting,
    #[serde(default = "default_task")]
    pub process_task_ref: String,
    #[serde(default = "default_model")]
    pub record_model_ref: String,
    #[serde(default = "default_response")]
    pub response_strategy: String,
    /// HTTP path; defaults to `/webhooks/<name>`.
    #[serde(default)]
    pub route: Option<String>,
    #[serde(default = "default_delete_after_days")]
    pub delete_after_days: u32,
}

impl WebhookSettings {
    /// Creates an entry with default options.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            signing_secret: String::new(),
            signature_header_name: default_signature_header(),
            signature_validator: default_validator(),
            webhook_profile: default_profile(),
            store_headers: StoreHeadersSetting::default(),
            process_task_ref: default_task(),
            record_model_ref: default_model(),
            response_strategy: default_response(),
            route: None,
            delete_after_days: default_delete_after_days(),
        }
    }

    /// Path the webhook is served on.
    pub fn route(&self) -> String {
        match &self.route {
            Some(route) if route.starts_with('/') => route.clone(),
            Some(route) => format!("/{route}"),
            None => format!("/webhooks/{}", self.name),
        }
    }

    /// Resolves identifiers through `catalog` and validates the result.
    pub fn build_config(&self, catalog: &CapabilityCatalog) -> WebhookClientResult<WebhookConfig> {
        WebhookConfig::builder(&self.name)
            .signing_secret(&self.signing_secret)
            .signature_header_name(&self.signature_header_name)
            .signature_validator(catalog.validator(&self.signature_validator)?)
            .webhook_profile(catalog.profile(&self.webhook_profile)?)
            .store_headers(self.store_headers.to_policy(&self.name)?)
            .process_task_ref(catalog.task(&self.process_task_ref)?)
            .record_model(catalog.model(&self.record_model_ref)?)
            .response_strategy(catalog.response(&self.response_strategy)?)
            .delete_after_days(self.delete_after_days)
            .build()
    }
}

impl fmt::Debug for WebhookSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookSettings")
            .field("name", &self.name)
            .field("signing_secret", &"<redacted>")
            .field("signature_header_name", &self.signature_header_name)
            .field("signature_validator", &self.signature_validator)
            .field("webhook_profile", &self.webhook_profile)
            .field("store_headers", &self.store_headers)
            .field("process_task_ref", &self.process_task_ref)
            .field("record_model_ref", &self.record_model_ref)
            .field("response_strategy", &self.response_strategy)
            .field("route", &self.route)
            .field("delete_after_days", &self.delete_after_days)
            .finish()
    }
}

fn default_signature_header() -> String {
    DEFAULT_SIGNATURE_HEADER.to_string()
}

fn default_validator() -> String {
    builtin::HMAC_SHA256.to_string()
}

fn default_profile() -> String {
    builtin::PROCESS_EVERYTHING.to_string()
}

fn default_task() -> String {
    DEFAULT_PROCESS_TASK.to_string()
}

fn default_model() -> String {
    builtin::WEBHOOK_CALL.to_string()
}

fn default_response() -> String {
    builtin::EMPTY_OK.to_string()
}

fn default_delete_after_days() -> u32 {
    DEFAULT_DELETE_AFTER_DAYS
}

#[cfg(test)]
mod tests {
    use super::*;

    const SETTINGS: &str = r#"
        [server]
        port = 9000
        add_unique_token_to_route_name = true

        [[webhooks]]
        name = "stripe"
        signing_secret = "abc123"
        store_headers = ["Signature"]
        response_strategy = "json_ok"

        [[webhooks]]
        name = "github"
        signing_secret = "def456"
        signature_header_name = "X-Hub-Signature"
        store_headers = "*"
        route = "hooks/github"
        delete_after_days = 7
    "#;

    #[test]
    fn test_parse_settings() {
        let settings = WebhookClientSettings::from_toml_str(SETTINGS).unwrap();

        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.server.host, "127.0.0.1");
        assert!(settings.server.add_unique_token_to_route_name);
        assert_eq!(settings.webhooks.len(), 2);

        let stripe = &settings.webhooks[0];
        assert_eq!(stripe.signature_header_name, "Signature");
        assert_eq!(stripe.signature_validator, "hmac_sha256");
        assert_eq!(stripe.route(), "/webhooks/stripe");
        assert_eq!(stripe.delete_after_days, 30);

        let github = &settings.webhooks[1];
        assert_eq!(github.route(), "/hooks/github");
        assert_eq!(github.store_headers, StoreHeadersSetting::Keyword("*".to_string()));
    }

    #[test]
    fn test_build_configs() {
        let settings = WebhookClientSettings::from_toml_str(SETTINGS).unwrap();
        let configs = settings.build_configs(&CapabilityCatalog::new()).unwrap();

        assert_eq!(configs[0].name(), "stripe");
        assert_eq!(configs[0].store_headers(), &StoreHeaders::only(["signature"]));
        assert_eq!(configs[1].signature_header_name(), "X-Hub-Signature");
        assert_eq!(configs[1].store_headers(), &StoreHeaders::All);
        assert_eq!(configs[1].delete_after_days(), 7);
    }

    #[test]
    fn test_store_headers_keywords() {
        let keyword = |k: &str| StoreHeadersSetting::Keyword(k.to_string()).to_policy("a");

        assert_eq!(keyword("ALL").unwrap(), StoreHeaders::All);
        assert_eq!(keyword("none").unwrap(), StoreHeaders::None);
        assert!(keyword("some").is_err());
        assert_eq!(
            StoreHeadersSetting::List(Vec::new()).to_policy("a").unwrap(),
            StoreHeaders::None
        );
    }

    #[test]
    fn test_unknown_capability_is_rejected() {
        let mut webhook = WebhookSettings::new("stripe");
        webhook.signing_secret = "abc123".to_string();
        webhook.webhook_profile = "process_some".to_string();

        let err = webhook.build_config(&CapabilityCatalog::new()).err().unwrap();
        assert!(matches!(err, WebhookClientError::UnknownCapability { kind: "webhook profile", .. }));
    }

    #[test]
    fn test_duplicate_names_are_rejected() {
        let mut first = WebhookSettings::new("stripe");
        first.signing_secret = "a".to_string();
        let mut second = WebhookSettings::new("stripe");
        second.signing_secret = "b".to_string();

        let settings = WebhookClientSettings {
            server: ServerSettings::default(),
            webhooks: vec![first, second],
        };

        let err = settings.build_configs(&CapabilityCatalog::new()).err().unwrap();
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let settings = WebhookClientSettings::from_toml_str(SETTINGS).unwrap();
        let debug = format!("{settings:?}");
        assert!(!debug.contains("abc123"));
        assert!(debug.contains("stripe"));
    }

    #[test]
    fn test_invalid_toml() {
        let err = WebhookClientSettings::from_toml_str("[[webhooks]]\nsigning_secret = 1").unwrap_err();
        assert!(matches!(err, WebhookClientError::Serialization { .. }));
    }
}

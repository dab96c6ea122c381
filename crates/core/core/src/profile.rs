//! Acceptance profiles decide whether an authentic call is worth keeping.

use crate::config::WebhookConfig;
use crate::request::IncomingWebhook;

/// Decides whether a validated call should be stored and processed.
///
/// Only consulted after the signature check passed. Returning false answers
/// the sender with a success response and drops the call.
pub trait WebhookProfile: Send + Sync {
    /// Returns true when the call should be persisted and dispatched.
    fn should_process(&self, request: &IncomingWebhook, config: &WebhookConfig) -> bool;
}

/// Keeps every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEverything;

impl WebhookProfile for ProcessEverything {
    fn should_process(&self, _request: &IncomingWebhook, _config: &WebhookConfig) -> bool {
        true
    }
}

/// Drops every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessNothing;

impl WebhookProfile for ProcessNothing {
    fn should_process(&self, _request: &IncomingWebhook, _config: &WebhookConfig) -> bool {
        false
    }
}

/// Adapts a closure into a profile.
pub struct FnProfile<F>(F)
where
    F: Fn(&IncomingWebhook, &WebhookConfig) -> bool + Send + Sync;

impl<F> FnProfile<F>
where
    F: Fn(&IncomingWebhook, &WebhookConfig) -> bool + Send + Sync,
{
    /// Wraps `predicate` as a profile.
    pub fn new(predicate: F) -> Self {
        Self(predicate)
    }
}

impl<F> WebhookProfile for FnProfile<F>
where
    F: Fn(&IncomingWebhook, &WebhookConfig) -> bool + Send + Sync,
{
    fn should_process(&self, request: &IncomingWebhook, config: &WebhookConfig) -> bool {
        (self.0)(request, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Headers;

    #[test]
    fn test_fixed_profiles() {
        let config = WebhookConfig::builder("github").signing_secret("s").build().unwrap();
        let request = IncomingWebhook::new("github", "{}", Headers::new());

        assert!(ProcessEverything.should_process(&request, &config));
        assert!(!ProcessNothing.should_process(&request, &config));
    }

    #[test]
    fn test_fn_profile_inspects_headers() {
        let config = WebhookConfig::builder("github").signing_secret("s").build().unwrap();
        let ignore_pings = FnProfile::new(|request: &IncomingWebhook, _: &WebhookConfig| {
            request.header("X-GitHub-Event") != Some("ping")
        });

        let ping = IncomingWebhook::new("github", "{}", [("X-GitHub-Event", "ping")]);
        let push = IncomingWebhook::new("github", "{}", [("X-GitHub-Event", "push")]);

        assert!(!ignore_pings.should_process(&ping, &config));
        assert!(ignore_pings.should_process(&push, &config));
    }
}

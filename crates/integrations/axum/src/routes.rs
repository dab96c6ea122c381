//! Route registration for webhook configs.

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use http::HeaderMap;
use std::collections::HashSet;
use std::sync::Arc;
use webhook_client_core::error::{WebhookClientError, WebhookClientResult};
use webhook_client_core::processor::WebhookProcessor;

use crate::{WebhookErrorResponse, to_axum_response, to_incoming_webhook};

/// Prefix of every generated route name.
pub const ROUTE_NAME_PREFIX: &str = "webhook-client-";

/// A path bound to a webhook config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteBinding {
    /// Unique route name.
    pub name: String,
    /// HTTP path accepting `POST`.
    pub path: String,
    /// Config every request on this path is processed with.
    pub config_name: String,
}

/// Builder binding HTTP paths to webhook configs.
///
/// # Example
///
/// ```rust,ignore
/// let router = WebhookRoutes::new(processor)
///     .route("/webhooks/stripe", "stripe")
///     .build()?;
///
/// let app = Router::new().merge(router.into_router());
/// ```
pub struct WebhookRoutes {
    processor: Arc<WebhookProcessor>,
    routes: Vec<(String, String)>,
    unique_tokens: bool,
}

impl WebhookRoutes {
    pub fn new(processor: Arc<WebhookProcessor>) -> Self {
        Self {
            processor,
            routes: Vec::new(),
            unique_tokens: false,
        }
    }

    /// Appends a random token to every route name, not only colliding ones.
    pub fn add_unique_token_to_route_name(mut self, enabled: bool) -> Self {
        self.unique_tokens = enabled;
        self
    }

    /// Binds `path` to the config named `config_name`.
    pub fn route(mut self, path: impl Into<String>, config_name: impl Into<String>) -> Self {
        self.routes.push((path.into(), config_name.into()));
        self
    }

    /// Names the routes and builds the router.
    ///
    /// Fails when two bindings share a path or a path is not a plain literal
    /// path (captures and wildcards are rejected).
    pub fn build(self) -> WebhookClientResult<WebhookRouter> {
        let mut names = HashSet::new();
        let mut paths = HashSet::new();
        let mut bindings = Vec::with_capacity(self.routes.len());
        let mut router = Router::new();

        for (path, config_name) in self.routes {
            let path = normalize_path(&path);
            if let Err(reason) = validate_path(&path) {
                return Err(WebhookClientError::invalid_config(
                    config_name,
                    format!("route `{path}` {reason}"),
                ));
            }
            if !paths.insert(path.clone()) {
                return Err(WebhookClientError::invalid_config(
                    config_name,
                    format!("route `{path}` is already bound"),
                ));
            }

            let name = route_name(&config_name, &names, self.unique_tokens);
            names.insert(name.clone());

            let state = RouteState {
                processor: self.processor.clone(),
                config_name: config_name.clone(),
            };
            router = router.route(&path, post(handle_webhook).with_state(state));

            tracing::debug!(route = %name, path = %path, config = %config_name, "Registered webhook route");
            bindings.push(RouteBinding {
                name,
                path,
                config_name,
            });
        }

        Ok(WebhookRouter { bindings, router })
    }
}

/// Routes built by [`WebhookRoutes`].
pub struct WebhookRouter {
    bindings: Vec<RouteBinding>,
    router: Router,
}

impl WebhookRouter {
    /// Registered bindings in registration order.
    pub fn bindings(&self) -> &[RouteBinding] {
        &self.bindings
    }

    /// Looks up a binding by route name.
    pub fn binding(&self, name: &str) -> Option<&RouteBinding> {
        self.bindings.iter().find(|binding| binding.name == name)
    }

    pub fn into_router(self) -> Router {
        self.router
    }
}

/// Shared state for one webhook route.
#[derive(Clone)]
struct RouteState {
    processor: Arc<WebhookProcessor>,
    config_name: String,
}

async fn handle_webhook(
    State(state): State<RouteState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request = to_incoming_webhook(&state.config_name, &headers, body);
    let processor = state.processor;

    // Runs detached: a client disconnect must not abort persistence or dispatch.
    let outcome = tokio::spawn(async move { processor.process(request).await }).await;

    match outcome {
        Ok(Ok(processed)) => to_axum_response(processed.response),
        Ok(Err(err)) => WebhookErrorResponse(err).into_response(),
        Err(err) => {
            tracing::error!(error = %err, "Webhook pipeline task failed");
            WebhookErrorResponse(WebhookClientError::internal(err.to_string())).into_response()
        }
    }
}

fn normalize_path(path: &str) -> String {
    let path = path.trim();
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

/// Only literal paths are accepted.
fn validate_path(path: &str) -> Result<(), &'static str> {
    if path.contains(['{', '}']) {
        return Err("must not contain `{` or `}`");
    }
    if path
        .split('/')
        .any(|segment| segment.starts_with(':') || segment.starts_with('*'))
    {
        return Err("must not contain `:` or `*` segments");
    }
    if path.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err("must not contain whitespace");
    }
    Ok(())
}

fn route_name(config_name: &str, taken: &HashSet<String>, always_tokenize: bool) -> String {
    let base = format!("{ROUTE_NAME_PREFIX}{config_name}");
    if !always_tokenize && !taken.contains(&base) {
        return base;
    }

    loop {
        let candidate = format!("{base}-{}", random_token());
        if !taken.contains(&candidate) {
            return candidate;
        }
    }
}

fn random_token() -> String {
    let mut token = uuid::Uuid::new_v4().simple().to_string();
    token.truncate(8);
    token
}

//! HTTP routes — webhook endpoints, health probe, CORS.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, HeaderName, Method};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::WebhookConfig;
use crate::error::WebhookError;
use crate::metrics;
use crate::store::Store;
use crate::webhooks;

/// Shared state for webhook handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: WebhookConfig,
}

/// Top-level application router.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/webhooks", webhook_router(state))
        .layer(TraceLayer::new_for_http())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Build the webhook router (nested at `/webhooks`).
///
/// Each provider group carries its own CORS layer so preflight requests are
/// answered before any handler logic, with the provider's custom headers
/// allowed.
pub fn webhook_router(state: AppState) -> Router {
    let github = Router::new()
        .route("/github", post(github_webhook))
        .route("/github/{token}", post(github_webhook_scoped))
        .layer(cors_layer(&["x-hub-signature-256", "x-github-event"]));

    let gitlab = Router::new()
        .route("/gitlab", post(gitlab_webhook))
        .route("/gitlab/{token}", post(gitlab_webhook_scoped))
        .layer(cors_layer(&["x-gitlab-token", "x-gitlab-event"]));

    let jenkins = Router::new()
        .route("/jenkins", post(jenkins_webhook))
        .route("/jenkins/{token}", post(jenkins_webhook_scoped))
        .layer(cors_layer(&["x-jenkins-token"]));

    let deploy = Router::new()
        .route("/deploy/{token}", post(deployment_webhook))
        .layer(cors_layer(&[]));

    Router::new()
        .merge(github)
        .merge(gitlab)
        .merge(jenkins)
        .merge(deploy)
        .with_state(state)
}

fn cors_layer(provider_headers: &[&'static str]) -> CorsLayer {
    // Every adapter allows the dashboard-client headers; providers add
    // their own on top.
    let mut allowed: Vec<HeaderName> = vec![
        HeaderName::from_static("authorization"),
        HeaderName::from_static("x-client-info"),
        HeaderName::from_static("apikey"),
        HeaderName::from_static("content-type"),
    ];
    allowed.extend(provider_headers.iter().map(|h| HeaderName::from_static(h)));

    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers(allowed)
}

fn record_event_metric(provider: &'static str, headers: &HeaderMap, event_header: &str) {
    let event = headers
        .get(event_header)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");
    metrics::webhook_received(provider, event);
}

// ── GitHub ──

async fn github_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, WebhookError> {
    record_event_metric("github", &headers, "x-github-event");
    webhooks::github::handle(&state, None, &headers, body).await
}

async fn github_webhook_scoped(
    State(state): State<AppState>,
    Path(token): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, WebhookError> {
    record_event_metric("github", &headers, "x-github-event");
    webhooks::github::handle(&state, Some(&token), &headers, body).await
}

// ── GitLab ──

async fn gitlab_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, WebhookError> {
    record_event_metric("gitlab", &headers, "x-gitlab-event");
    webhooks::gitlab::handle(&state, None, &headers, body).await
}

async fn gitlab_webhook_scoped(
    State(state): State<AppState>,
    Path(token): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, WebhookError> {
    record_event_metric("gitlab", &headers, "x-gitlab-event");
    webhooks::gitlab::handle(&state, Some(&token), &headers, body).await
}

// ── Jenkins ──

#[derive(serde::Deserialize)]
struct JenkinsAuthQuery {
    token: Option<String>,
}

async fn jenkins_webhook(
    State(state): State<AppState>,
    Query(query): Query<JenkinsAuthQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, WebhookError> {
    metrics::webhook_received("jenkins", "build");
    webhooks::jenkins::handle(&state, None, &headers, query.token.as_deref(), body).await
}

async fn jenkins_webhook_scoped(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Query(query): Query<JenkinsAuthQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, WebhookError> {
    metrics::webhook_received("jenkins", "build");
    webhooks::jenkins::handle(&state, Some(&token), &headers, query.token.as_deref(), body).await
}

// ── Deployment ──

async fn deployment_webhook(
    State(state): State<AppState>,
    Path(token): Path<String>,
    body: Bytes,
) -> Result<Response, WebhookError> {
    metrics::webhook_received("deploy", "deployment");
    webhooks::deploy::handle(&state, &token, body).await
}

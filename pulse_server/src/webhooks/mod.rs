//! Webhook ingestion core.
//!
//! Every provider adapter runs the same flow: authenticate the sender,
//! filter the event kind, validate the payload, map the provider status
//! vocabulary onto [`PipelineStatus`], then hand a normalized event to the
//! shared persistence functions below. The per-provider modules own only
//! their schema, auth method, and status mapping.

pub mod auth;
pub mod deploy;
pub mod github;
pub mod gitlab;
pub mod jenkins;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::{FieldDiagnostic, WebhookError};
use crate::metrics;
use crate::models::deployment::{Deployment, NewDeployment};
use crate::models::pipeline::{NewPipeline, Pipeline};
use crate::models::profile::Profile;
use crate::models::project::{NewProject, Project};
use crate::models::status::{DeployEnvironment, PipelineStatus};
use crate::store::Store;

/// How an adapter looks up the owning project.
#[derive(Debug, Clone, Copy)]
pub enum ProjectScope {
    /// (name, owning account) — self-service providers with per-account
    /// tokens.
    Owner,
    /// Name alone — shared-secret providers whose payloads carry no account
    /// information.
    Name,
}

/// A provider event normalized onto the canonical pipeline model.
#[derive(Debug, Clone)]
pub struct PipelineEvent {
    pub project_name: String,
    pub repository_url: Option<String>,
    pub run_number: i64,
    pub branch: String,
    pub commit_hash: String,
    pub status: PipelineStatus,
    pub duration_seconds: Option<i32>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// A provider event normalized onto the canonical deployment model.
#[derive(Debug, Clone)]
pub struct DeploymentEvent {
    pub project_name: String,
    pub environment: DeployEnvironment,
    pub version: String,
    pub status: PipelineStatus,
    pub pipeline_run_number: Option<i64>,
    pub deployed_at: DateTime<Utc>,
}

/// Find-or-create the owning project, then upsert the pipeline run.
pub async fn record_pipeline(
    store: &dyn Store,
    account: &Profile,
    scope: ProjectScope,
    event: PipelineEvent,
) -> Result<Pipeline, WebhookError> {
    let PipelineEvent {
        project_name,
        repository_url,
        run_number,
        branch,
        commit_hash,
        status,
        duration_seconds,
        started_at,
        completed_at,
    } = event;

    let owner = match scope {
        ProjectScope::Owner => Some(account.user_id),
        ProjectScope::Name => None,
    };

    let project = resolve_project(store, &project_name, owner, repository_url, account).await?;

    let pipeline = store
        .upsert_pipeline(NewPipeline {
            project_id: project.id,
            run_number,
            branch,
            commit_hash,
            status: status.as_str().to_string(),
            duration_seconds,
            triggered_by: account.user_id,
            started_at,
            completed_at,
        })
        .await?;

    metrics::pipeline_recorded(status.as_str());
    tracing::info!(
        pipeline_id = pipeline.id,
        project = %project_name,
        run_number,
        status = %status,
        "Pipeline recorded"
    );

    Ok(pipeline)
}

/// Find-or-create the owning project, link the pipeline run best-effort,
/// insert the deployment.
pub async fn record_deployment(
    store: &dyn Store,
    account: &Profile,
    event: DeploymentEvent,
) -> Result<Deployment, WebhookError> {
    let project = resolve_project(
        store,
        &event.project_name,
        Some(account.user_id),
        None,
        account,
    )
    .await?;

    // A dangling run-number reference never blocks the deployment.
    let pipeline_id = match event.pipeline_run_number {
        Some(run_number) => {
            let found = store.pipeline_by_run_number(project.id, run_number).await?;
            if found.is_none() {
                tracing::warn!(
                    project = %event.project_name,
                    run_number,
                    "Deployment references an unknown pipeline run; recording without link"
                );
            }
            found.map(|p| p.id)
        }
        None => None,
    };

    let deployment = store
        .insert_deployment(NewDeployment {
            project_id: project.id,
            pipeline_id,
            environment: event.environment.as_str().to_string(),
            version: event.version,
            status: event.status.as_str().to_string(),
            deployed_by: account.user_id,
            deployed_at: event.deployed_at,
        })
        .await?;

    metrics::deployment_recorded(event.environment.as_str());

    Ok(deployment)
}

async fn resolve_project(
    store: &dyn Store,
    name: &str,
    owner: Option<uuid::Uuid>,
    repository_url: Option<String>,
    account: &Profile,
) -> Result<Project, WebhookError> {
    match store.project_by_name(name, owner).await? {
        Some(project) => Ok(project),
        None => Ok(store
            .create_project(NewProject {
                name: name.to_string(),
                repository_url,
                created_by: account.user_id,
            })
            .await?),
    }
}

/// Parse the raw request body as JSON. Not-JSON is distinct from a parsed
/// body that fails schema validation.
pub fn parse_json(body: &[u8]) -> Result<Value, WebhookError> {
    serde_json::from_slice(body).map_err(|_| WebhookError::BadRequest)
}

/// Deserialize a parsed payload into a provider schema; serde failures
/// become field diagnostics. Unknown fields are ignored.
pub fn deserialize_payload<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, WebhookError> {
    serde_json::from_value(value)
        .map_err(|e| WebhookError::Validation(vec![FieldDiagnostic::new("payload", e.to_string())]))
}

pub(crate) fn check_len(diags: &mut Vec<FieldDiagnostic>, field: &str, value: &str, max: usize) {
    if value.len() > max {
        diags.push(FieldDiagnostic::new(
            field,
            format!("must be at most {max} characters"),
        ));
    }
}

pub(crate) fn check_url(diags: &mut Vec<FieldDiagnostic>, field: &str, value: &str, max: usize) {
    check_len(diags, field, value, max);
    if url::Url::parse(value).is_err() {
        diags.push(FieldDiagnostic::new(field, "must be a valid URL"));
    }
}

/// 200 envelope with provider-specific context fields.
pub fn success_response(message: &str, context: Value) -> Response {
    let mut body = serde_json::json!({ "success": true, "message": message });
    if let (Some(obj), Some(extra)) = (body.as_object_mut(), context.as_object()) {
        for (key, value) in extra {
            obj.insert(key.clone(), value.clone());
        }
    }
    (StatusCode::OK, Json(body)).into_response()
}

/// 200 no-op for event kinds this service does not process. A non-2xx here
/// would make the provider re-deliver forever.
pub fn ignored_response() -> Response {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "success": true,
            "message": "Event type not processed",
        })),
    )
        .into_response()
}

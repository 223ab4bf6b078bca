//! Generic deployment adapter — CD tools report deployments directly.

use axum::body::Bytes;
use axum::response::Response;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::{FieldDiagnostic, WebhookError};
use crate::models::status::{DeployEnvironment, PipelineStatus};
use crate::routes::AppState;
use crate::webhooks::{self, auth, DeploymentEvent};

const MAX_NAME: usize = 255;

/// Deployment outcome as reported by the CD tool. A deployment is never
/// observed mid-flight, so `running` has no place here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeployStatus {
    Success,
    Failed,
    Pending,
    Cancelled,
}

impl DeployStatus {
    fn canonical(self) -> PipelineStatus {
        match self {
            DeployStatus::Success => PipelineStatus::Success,
            DeployStatus::Failed => PipelineStatus::Failed,
            DeployStatus::Pending => PipelineStatus::Pending,
            DeployStatus::Cancelled => PipelineStatus::Cancelled,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DeploymentPayload {
    pub project_name: String,
    pub environment: DeployEnvironment,
    pub version: String,
    pub status: DeployStatus,
    pub pipeline_run_number: Option<i64>,
    pub deployed_at: Option<DateTime<Utc>>,
}

impl DeploymentPayload {
    fn validate(&self) -> Vec<FieldDiagnostic> {
        let mut diags = Vec::new();
        webhooks::check_len(&mut diags, "project_name", &self.project_name, MAX_NAME);
        webhooks::check_len(&mut diags, "version", &self.version, MAX_NAME);
        diags
    }
}

/// Handle an incoming deployment webhook. Path-token auth only.
pub async fn handle(state: &AppState, token: &str, body: Bytes) -> Result<Response, WebhookError> {
    let account = auth::resolve_path_token(state.store.as_ref(), token).await?;

    let payload = webhooks::parse_json(&body)?;
    let event: DeploymentPayload = webhooks::deserialize_payload(payload)?;
    let diags = event.validate();
    if !diags.is_empty() {
        return Err(WebhookError::Validation(diags));
    }

    let normalized = DeploymentEvent {
        project_name: event.project_name.clone(),
        environment: event.environment,
        version: event.version.clone(),
        status: event.status.canonical(),
        pipeline_run_number: event.pipeline_run_number,
        deployed_at: event.deployed_at.unwrap_or_else(Utc::now),
    };

    let deployment =
        webhooks::record_deployment(state.store.as_ref(), &account, normalized).await?;

    Ok(webhooks::success_response(
        "Deployment recorded successfully",
        serde_json::json!({
            "deployment_id": deployment.id,
            "project": event.project_name,
            "environment": deployment.environment,
        }),
    ))
}

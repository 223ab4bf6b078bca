//! GitLab CI adapter — pipeline hook events.

use axum::body::Bytes;
use axum::http::HeaderMap;
use axum::response::Response;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{FieldDiagnostic, WebhookError};
use crate::models::status::PipelineStatus;
use crate::routes::AppState;
use crate::webhooks::{self, auth, PipelineEvent, ProjectScope};

const MAX_NAME: usize = 255;
const MAX_SHA: usize = 40;
const MAX_URL: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GitlabStatus {
    Pending,
    Running,
    Success,
    Failed,
    Canceled,
    Skipped,
}

#[derive(Debug, Deserialize)]
pub struct PipelineHook {
    pub object_attributes: ObjectAttributes,
    pub project: GitlabProject,
    pub user: GitlabUser,
}

#[derive(Debug, Deserialize)]
pub struct ObjectAttributes {
    pub id: i64,
    pub iid: i64,
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub sha: String,
    pub status: GitlabStatus,
    pub duration: Option<f64>,
    #[serde(deserialize_with = "gitlab_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "gitlab_datetime_opt")]
    pub finished_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct GitlabProject {
    pub name: String,
    pub web_url: String,
}

#[derive(Debug, Deserialize)]
pub struct GitlabUser {
    pub username: String,
}

impl PipelineHook {
    fn validate(&self) -> Vec<FieldDiagnostic> {
        let mut diags = Vec::new();
        webhooks::check_len(
            &mut diags,
            "object_attributes.ref",
            &self.object_attributes.git_ref,
            MAX_NAME,
        );
        webhooks::check_len(
            &mut diags,
            "object_attributes.sha",
            &self.object_attributes.sha,
            MAX_SHA,
        );
        webhooks::check_len(&mut diags, "project.name", &self.project.name, MAX_NAME);
        webhooks::check_url(&mut diags, "project.web_url", &self.project.web_url, MAX_URL);
        webhooks::check_len(&mut diags, "user.username", &self.user.username, MAX_NAME);
        diags
    }
}

/// GitLab reports pipeline timestamps either as RFC 3339 or as
/// `2016-08-12 15:23:28 UTC`, depending on version and endpoint.
fn parse_gitlab_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s.trim_end_matches(" UTC"), "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

fn gitlab_datetime<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_gitlab_timestamp(&s)
        .ok_or_else(|| serde::de::Error::custom(format!("unrecognized timestamp: {s}")))
}

fn gitlab_datetime_opt<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(s) => parse_gitlab_timestamp(&s)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("unrecognized timestamp: {s}"))),
    }
}

/// Map GitLab's pipeline status onto the canonical vocabulary.
pub fn map_status(status: GitlabStatus) -> PipelineStatus {
    match status {
        GitlabStatus::Pending => PipelineStatus::Pending,
        GitlabStatus::Running => PipelineStatus::Running,
        GitlabStatus::Success => PipelineStatus::Success,
        GitlabStatus::Failed => PipelineStatus::Failed,
        GitlabStatus::Canceled => PipelineStatus::Cancelled,
        // A skipped pipeline produced no result the dashboard can count on.
        GitlabStatus::Skipped => PipelineStatus::Failed,
    }
}

/// Handle an incoming GitLab webhook.
pub async fn handle(
    state: &AppState,
    token: Option<&str>,
    headers: &HeaderMap,
    body: Bytes,
) -> Result<Response, WebhookError> {
    let presented = headers.get("x-gitlab-token").and_then(|v| v.to_str().ok());
    auth::verify_shared_secret(&state.config.gitlab_webhook_secret, presented)?;

    let account = auth::resolve_scoped_account(state.store.as_ref(), token).await?;

    let payload = webhooks::parse_json(&body)?;

    // GitLab sends every hook kind to one endpoint; only pipeline hooks
    // carry the state this service tracks.
    let object_kind = payload
        .get("object_kind")
        .and_then(Value::as_str)
        .unwrap_or("unknown");
    if object_kind != "pipeline" {
        tracing::debug!("Ignoring GitLab event: {}", object_kind);
        return Ok(webhooks::ignored_response());
    }

    let event: PipelineHook = webhooks::deserialize_payload(payload)?;
    let diags = event.validate();
    if !diags.is_empty() {
        return Err(WebhookError::Validation(diags));
    }

    tracing::debug!(
        pipeline_id = event.object_attributes.id,
        user = %event.user.username,
        "Processing GitLab pipeline event"
    );

    let status = map_status(event.object_attributes.status);

    let normalized = PipelineEvent {
        project_name: event.project.name.clone(),
        repository_url: Some(event.project.web_url.clone()),
        run_number: event.object_attributes.iid,
        branch: event.object_attributes.git_ref,
        commit_hash: event.object_attributes.sha,
        status,
        duration_seconds: event.object_attributes.duration.map(|d| d as i32),
        started_at: event.object_attributes.created_at,
        completed_at: event.object_attributes.finished_at,
    };

    let pipeline =
        webhooks::record_pipeline(state.store.as_ref(), &account, ProjectScope::Name, normalized)
            .await?;

    Ok(webhooks::success_response(
        "Pipeline updated successfully",
        serde_json::json!({
            "project": event.project.name,
            "pipeline_id": pipeline.run_number,
        }),
    ))
}

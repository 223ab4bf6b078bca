//! Jenkins adapter — notification-plugin build events.

use axum::body::Bytes;
use axum::http::HeaderMap;
use axum::response::Response;
use chrono::Utc;
use serde::Deserialize;

use crate::error::{FieldDiagnostic, WebhookError};
use crate::models::status::PipelineStatus;
use crate::routes::AppState;
use crate::webhooks::{self, auth, PipelineEvent, ProjectScope};

const MAX_NAME: usize = 255;
const MAX_SHA: usize = 40;
const MAX_URL: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuildPhase {
    Started,
    Completed,
    Finalized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuildResult {
    Success,
    Failure,
    Unstable,
    Aborted,
    NotBuilt,
}

#[derive(Debug, Deserialize)]
pub struct BuildNotification {
    pub name: String,
    pub url: String,
    pub build: Build,
}

#[derive(Debug, Deserialize)]
pub struct Build {
    pub number: i64,
    pub phase: BuildPhase,
    pub status: Option<BuildResult>,
    pub url: String,
    pub scm: Option<Scm>,
    /// Milliseconds, as the notification plugin reports it.
    pub duration: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Scm {
    pub commit: Option<String>,
    pub branch: Option<String>,
}

impl BuildNotification {
    fn validate(&self) -> Vec<FieldDiagnostic> {
        let mut diags = Vec::new();
        webhooks::check_len(&mut diags, "name", &self.name, MAX_NAME);
        webhooks::check_url(&mut diags, "url", &self.url, MAX_URL);
        webhooks::check_url(&mut diags, "build.url", &self.build.url, MAX_URL);
        if let Some(scm) = &self.build.scm {
            if let Some(commit) = &scm.commit {
                webhooks::check_len(&mut diags, "build.scm.commit", commit, MAX_SHA);
            }
            if let Some(branch) = &scm.branch {
                webhooks::check_len(&mut diags, "build.scm.branch", branch, MAX_NAME);
            }
        }
        diags
    }
}

/// Map a Jenkins phase/result pair onto the canonical vocabulary.
pub fn map_status(phase: BuildPhase, status: Option<BuildResult>) -> PipelineStatus {
    match phase {
        BuildPhase::Started => PipelineStatus::Running,
        BuildPhase::Completed | BuildPhase::Finalized => match status {
            Some(BuildResult::Success) => PipelineStatus::Success,
            Some(BuildResult::Aborted) => PipelineStatus::Cancelled,
            // FAILURE, UNSTABLE, NOT_BUILT, or no result at all.
            _ => PipelineStatus::Failed,
        },
    }
}

/// Handle an incoming Jenkins webhook. The token arrives in the
/// x-jenkins-token header or the `token` query parameter.
pub async fn handle(
    state: &AppState,
    token: Option<&str>,
    headers: &HeaderMap,
    query_token: Option<&str>,
    body: Bytes,
) -> Result<Response, WebhookError> {
    let presented = headers
        .get("x-jenkins-token")
        .and_then(|v| v.to_str().ok())
        .or(query_token);
    auth::verify_shared_secret(&state.config.jenkins_webhook_secret, presented)?;

    let account = auth::resolve_scoped_account(state.store.as_ref(), token).await?;

    let payload = webhooks::parse_json(&body)?;
    let event: BuildNotification = webhooks::deserialize_payload(payload)?;
    let diags = event.validate();
    if !diags.is_empty() {
        return Err(WebhookError::Validation(diags));
    }

    let status = map_status(event.build.phase, event.build.status);
    let completed = matches!(
        event.build.phase,
        BuildPhase::Completed | BuildPhase::Finalized
    );
    // The notification payload carries no timestamps of its own.
    let now = Utc::now();

    let scm = event.build.scm.unwrap_or_default();
    let normalized = PipelineEvent {
        project_name: event.name.clone(),
        repository_url: Some(event.url.clone()),
        run_number: event.build.number,
        branch: scm.branch.unwrap_or_else(|| "main".to_string()),
        commit_hash: scm.commit.unwrap_or_else(|| "unknown".to_string()),
        status,
        duration_seconds: event.build.duration.map(|ms| (ms / 1000) as i32),
        started_at: now,
        completed_at: completed.then_some(now),
    };

    let pipeline =
        webhooks::record_pipeline(state.store.as_ref(), &account, ProjectScope::Name, normalized)
            .await?;

    Ok(webhooks::success_response(
        "Pipeline updated successfully",
        serde_json::json!({
            "project": event.name,
            "build_number": pipeline.run_number,
        }),
    ))
}

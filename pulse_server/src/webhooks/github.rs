//! GitHub Actions adapter — `workflow_run` webhook events.

use axum::body::Bytes;
use axum::http::HeaderMap;
use axum::response::Response;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::{FieldDiagnostic, WebhookError};
use crate::models::status::PipelineStatus;
use crate::routes::AppState;
use crate::webhooks::{self, auth, PipelineEvent, ProjectScope};

const MAX_NAME: usize = 255;
const MAX_SHA: usize = 40;
const MAX_URL: usize = 500;

/// Workflow execution phase as GitHub reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Queued,
    InProgress,
    Completed,
}

/// Conclusion of a completed workflow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowConclusion {
    Success,
    Failure,
    Cancelled,
    Skipped,
    TimedOut,
    ActionRequired,
}

#[derive(Debug, Deserialize)]
pub struct WorkflowRunEvent {
    pub action: String,
    pub workflow_run: WorkflowRun,
    pub repository: Repository,
    pub sender: Sender,
}

#[derive(Debug, Deserialize)]
pub struct WorkflowRun {
    pub id: i64,
    pub name: String,
    pub head_branch: String,
    pub head_sha: String,
    pub status: WorkflowStatus,
    pub conclusion: Option<WorkflowConclusion>,
    pub run_number: i64,
    pub updated_at: DateTime<Utc>,
    pub run_started_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct Repository {
    pub name: String,
    pub full_name: String,
    pub html_url: String,
}

#[derive(Debug, Deserialize)]
pub struct Sender {
    pub login: String,
}

impl WorkflowRunEvent {
    fn validate(&self) -> Vec<FieldDiagnostic> {
        let mut diags = Vec::new();
        webhooks::check_len(&mut diags, "workflow_run.name", &self.workflow_run.name, MAX_NAME);
        webhooks::check_len(
            &mut diags,
            "workflow_run.head_branch",
            &self.workflow_run.head_branch,
            MAX_NAME,
        );
        webhooks::check_len(
            &mut diags,
            "workflow_run.head_sha",
            &self.workflow_run.head_sha,
            MAX_SHA,
        );
        webhooks::check_len(&mut diags, "repository.name", &self.repository.name, MAX_NAME);
        webhooks::check_len(
            &mut diags,
            "repository.full_name",
            &self.repository.full_name,
            MAX_NAME,
        );
        webhooks::check_url(
            &mut diags,
            "repository.html_url",
            &self.repository.html_url,
            MAX_URL,
        );
        webhooks::check_len(&mut diags, "sender.login", &self.sender.login, MAX_NAME);
        diags
    }
}

/// Map GitHub's status/conclusion pair onto the canonical vocabulary.
/// Total over the whole domain; unrecognized combinations land on `Failed`.
pub fn map_status(
    status: WorkflowStatus,
    conclusion: Option<WorkflowConclusion>,
) -> PipelineStatus {
    match (status, conclusion) {
        (WorkflowStatus::Queued, _) => PipelineStatus::Pending,
        (WorkflowStatus::InProgress, _) => PipelineStatus::Running,
        (WorkflowStatus::Completed, Some(WorkflowConclusion::Success)) => PipelineStatus::Success,
        (WorkflowStatus::Completed, Some(WorkflowConclusion::Cancelled)) => {
            PipelineStatus::Cancelled
        }
        (WorkflowStatus::Completed, _) => PipelineStatus::Failed,
    }
}

/// Handle an incoming GitHub webhook.
///
/// A path token resolves the owning account directly; the tokenless route
/// requires an HMAC signature with the configured shared secret and falls
/// back to sole-account identity.
pub async fn handle(
    state: &AppState,
    token: Option<&str>,
    headers: &HeaderMap,
    body: Bytes,
) -> Result<Response, WebhookError> {
    let account = match token {
        Some(token) => auth::resolve_path_token(state.store.as_ref(), token).await?,
        None => {
            let signature = headers
                .get("x-hub-signature-256")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("");
            if !auth::verify_signature(&state.config.github_webhook_secret, &body, signature) {
                tracing::warn!("GitHub webhook signature validation failed");
                return Err(WebhookError::Unauthorized);
            }
            auth::resolve_scoped_account(state.store.as_ref(), None).await?
        }
    };

    // Only workflow_run events carry pipeline state.
    let event_type = headers
        .get("x-github-event")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");
    if event_type != "workflow_run" {
        tracing::debug!("Ignoring GitHub event: {}", event_type);
        return Ok(webhooks::ignored_response());
    }

    let payload = webhooks::parse_json(&body)?;
    let event: WorkflowRunEvent = webhooks::deserialize_payload(payload)?;
    let diags = event.validate();
    if !diags.is_empty() {
        return Err(WebhookError::Validation(diags));
    }

    tracing::debug!(
        action = %event.action,
        run_id = event.workflow_run.id,
        sender = %event.sender.login,
        "Processing workflow_run event"
    );

    let status = map_status(event.workflow_run.status, event.workflow_run.conclusion);
    let completed = event.workflow_run.status == WorkflowStatus::Completed;
    let now = Utc::now();

    // Derived only once the run completes; GitHub reports no duration field.
    let duration_seconds = match (completed, event.workflow_run.run_started_at) {
        (true, Some(started)) => {
            Some((event.workflow_run.updated_at - started).num_seconds() as i32)
        }
        _ => None,
    };

    let normalized = PipelineEvent {
        project_name: event.repository.name.clone(),
        repository_url: Some(event.repository.html_url.clone()),
        run_number: event.workflow_run.run_number,
        branch: event.workflow_run.head_branch,
        commit_hash: event.workflow_run.head_sha,
        status,
        duration_seconds,
        started_at: event.workflow_run.run_started_at.unwrap_or(now),
        completed_at: completed.then_some(event.workflow_run.updated_at),
    };

    let pipeline =
        webhooks::record_pipeline(state.store.as_ref(), &account, ProjectScope::Owner, normalized)
            .await?;

    Ok(webhooks::success_response(
        "Pipeline updated successfully",
        serde_json::json!({
            "project": event.repository.name,
            "run_number": pipeline.run_number,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_is_total() {
        use WorkflowConclusion::*;

        let conclusions = [
            None,
            Some(Success),
            Some(Failure),
            Some(Cancelled),
            Some(Skipped),
            Some(TimedOut),
            Some(ActionRequired),
        ];
        for status in [
            WorkflowStatus::Queued,
            WorkflowStatus::InProgress,
            WorkflowStatus::Completed,
        ] {
            for conclusion in conclusions {
                // Must land somewhere in the canonical set for every combination.
                let _ = map_status(status, conclusion);
            }
        }
    }

    #[test]
    fn phases_before_completion() {
        assert_eq!(
            map_status(WorkflowStatus::Queued, None),
            PipelineStatus::Pending
        );
        assert_eq!(
            map_status(WorkflowStatus::InProgress, None),
            PipelineStatus::Running
        );
    }

    #[test]
    fn completed_conclusions() {
        use WorkflowConclusion::*;

        assert_eq!(
            map_status(WorkflowStatus::Completed, Some(Success)),
            PipelineStatus::Success
        );
        assert_eq!(
            map_status(WorkflowStatus::Completed, Some(Cancelled)),
            PipelineStatus::Cancelled
        );
        for unrecognized in [Some(Failure), Some(Skipped), Some(TimedOut), Some(ActionRequired), None] {
            assert_eq!(
                map_status(WorkflowStatus::Completed, unrecognized),
                PipelineStatus::Failed
            );
        }
    }

    #[test]
    fn validation_flags_oversized_fields() {
        let payload = serde_json::json!({
            "action": "completed",
            "workflow_run": {
                "id": 1,
                "name": "CI",
                "head_branch": "a".repeat(300),
                "head_sha": "abc",
                "status": "queued",
                "conclusion": null,
                "run_number": 1,
                "created_at": "2024-01-01T00:00:00Z",
                "updated_at": "2024-01-01T00:00:00Z",
                "run_started_at": null,
            },
            "repository": {
                "name": "repo",
                "full_name": "acme/repo",
                "html_url": "not a url",
            },
            "sender": { "login": "octocat" },
        });

        let event: WorkflowRunEvent = serde_json::from_value(payload).unwrap();
        let diags = event.validate();
        let fields: Vec<&str> = diags.iter().map(|d| d.field.as_str()).collect();
        assert!(fields.contains(&"workflow_run.head_branch"));
        assert!(fields.contains(&"repository.html_url"));
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let payload = serde_json::json!({
            "action": "completed",
            "extra_top_level": true,
            "workflow_run": {
                "id": 1,
                "name": "CI",
                "head_branch": "main",
                "head_sha": "abc",
                "status": "completed",
                "conclusion": "success",
                "run_number": 9,
                "created_at": "2024-01-01T00:00:00Z",
                "updated_at": "2024-01-01T00:02:05Z",
                "run_started_at": "2024-01-01T00:00:00Z",
                "some_future_field": {"nested": 1},
            },
            "repository": {
                "name": "repo",
                "full_name": "acme/repo",
                "html_url": "https://github.com/acme/repo",
            },
            "sender": { "login": "octocat" },
        });

        let event: WorkflowRunEvent = serde_json::from_value(payload).unwrap();
        assert_eq!(event.workflow_run.run_number, 9);
        assert!(event.validate().is_empty());
    }
}

//! A pipeline run — one execution of a CI workflow.
//!
//! (project_id, run_number) is unique and serves as the idempotency key:
//! every event for the same run mutates the same row.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::schema::pipelines;

#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = pipelines)]
pub struct Pipeline {
    pub id: i64,
    pub project_id: i64,
    pub run_number: i64,
    pub branch: String,
    pub commit_hash: String,
    pub status: String,
    pub duration_seconds: Option<i32>,
    pub triggered_by: Uuid,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub create_date: Option<DateTime<Utc>>,
    pub write_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = pipelines)]
pub struct NewPipeline {
    pub project_id: i64,
    pub run_number: i64,
    pub branch: String,
    pub commit_hash: String,
    pub status: String,
    pub duration_seconds: Option<i32>,
    pub triggered_by: Uuid,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

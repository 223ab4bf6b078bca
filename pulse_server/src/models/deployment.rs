//! A deployment action, optionally linked to the pipeline run that built it.
//!
//! Deployments have no natural external identifier, so every inbound event
//! is a new row.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::schema::deployments;

#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = deployments)]
pub struct Deployment {
    pub id: i64,
    pub project_id: i64,
    pub pipeline_id: Option<i64>,
    pub environment: String,
    pub version: String,
    pub status: String,
    pub deployed_by: Uuid,
    pub deployed_at: DateTime<Utc>,
    pub create_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = deployments)]
pub struct NewDeployment {
    pub project_id: i64,
    pub pipeline_id: Option<i64>,
    pub environment: String,
    pub version: String,
    pub status: String,
    pub deployed_by: Uuid,
    pub deployed_at: DateTime<Utc>,
}

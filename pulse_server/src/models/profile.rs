//! An account able to receive webhooks, identified by its opaque token.
//!
//! Profiles are provisioned by the dashboard's account flow; this service
//! only ever reads them.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::schema::profiles;

#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = profiles)]
pub struct Profile {
    pub id: i64,
    pub user_id: Uuid,
    pub webhook_token: String,
    pub create_date: Option<DateTime<Utc>>,
}

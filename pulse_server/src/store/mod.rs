//! Storage seam between the webhook adapters and PostgreSQL.
//!
//! Adapters talk to [`Store`]; the production implementation draws pooled
//! diesel connections and delegates to the service-layer queries. Tests run
//! the same adapters against the in-memory implementation.

use async_trait::async_trait;
use diesel_async::pooled_connection::deadpool::{Object, Pool};
use diesel_async::AsyncPgConnection;
use uuid::Uuid;

use crate::models::deployment::{Deployment, NewDeployment};
use crate::models::pipeline::{NewPipeline, Pipeline};
use crate::models::profile::Profile;
use crate::models::project::{NewProject, Project};
use crate::services::{deployment_service, pipeline_service, profile_service, project_service};

#[cfg(test)]
pub mod memory;

pub type PgPool = Pool<AsyncPgConnection>;

/// The relational-store operations the ingestion core needs.
#[async_trait]
pub trait Store: Send + Sync {
    async fn profile_by_token(&self, token: &str) -> anyhow::Result<Option<Profile>>;

    /// The sole registered account, when exactly one exists.
    async fn sole_profile(&self) -> anyhow::Result<Option<Profile>>;

    async fn project_by_name(
        &self,
        name: &str,
        owner: Option<Uuid>,
    ) -> anyhow::Result<Option<Project>>;

    /// Conflict-safe: concurrent creation of the same (name, owner)
    /// resolves to the existing row instead of failing.
    async fn create_project(&self, new_project: NewProject) -> anyhow::Result<Project>;

    async fn pipeline_by_run_number(
        &self,
        project_id: i64,
        run_number: i64,
    ) -> anyhow::Result<Option<Pipeline>>;

    /// Atomic insert-or-update on (project_id, run_number); updates touch
    /// only status, duration and completion.
    async fn upsert_pipeline(&self, new_pipeline: NewPipeline) -> anyhow::Result<Pipeline>;

    async fn insert_deployment(&self, new_deployment: NewDeployment) -> anyhow::Result<Deployment>;
}

/// PostgreSQL-backed [`Store`].
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn conn(&self) -> anyhow::Result<Object<AsyncPgConnection>> {
        self.pool
            .get()
            .await
            .map_err(|e| anyhow::anyhow!("diesel pool: {e}"))
    }
}

#[async_trait]
impl Store for PgStore {
    async fn profile_by_token(&self, token: &str) -> anyhow::Result<Option<Profile>> {
        let mut conn = self.conn().await?;
        profile_service::find_by_token(&mut conn, token).await
    }

    async fn sole_profile(&self) -> anyhow::Result<Option<Profile>> {
        let mut conn = self.conn().await?;
        profile_service::sole_account(&mut conn).await
    }

    async fn project_by_name(
        &self,
        name: &str,
        owner: Option<Uuid>,
    ) -> anyhow::Result<Option<Project>> {
        let mut conn = self.conn().await?;
        project_service::find_by_name(&mut conn, name, owner).await
    }

    async fn create_project(&self, new_project: NewProject) -> anyhow::Result<Project> {
        let mut conn = self.conn().await?;
        project_service::create(&mut conn, new_project).await
    }

    async fn pipeline_by_run_number(
        &self,
        project_id: i64,
        run_number: i64,
    ) -> anyhow::Result<Option<Pipeline>> {
        let mut conn = self.conn().await?;
        pipeline_service::find_by_run_number(&mut conn, project_id, run_number).await
    }

    async fn upsert_pipeline(&self, new_pipeline: NewPipeline) -> anyhow::Result<Pipeline> {
        let mut conn = self.conn().await?;
        pipeline_service::upsert(&mut conn, new_pipeline).await
    }

    async fn insert_deployment(&self, new_deployment: NewDeployment) -> anyhow::Result<Deployment> {
        let mut conn = self.conn().await?;
        deployment_service::insert(&mut conn, new_deployment).await
    }
}

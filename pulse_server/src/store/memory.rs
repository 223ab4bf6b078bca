//! In-memory [`Store`] with the same conflict semantics as PostgreSQL,
//! used by the adapter tests.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::models::deployment::{Deployment, NewDeployment};
use crate::models::pipeline::{NewPipeline, Pipeline};
use crate::models::profile::Profile;
use crate::models::project::{NewProject, Project};
use crate::store::Store;

#[derive(Default)]
struct Inner {
    profiles: Vec<Profile>,
    projects: Vec<Project>,
    pipelines: Vec<Pipeline>,
    deployments: Vec<Deployment>,
    next_id: i64,
}

impl Inner {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_profile(&self, user_id: Uuid, webhook_token: &str) -> Profile {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.next_id();
        let profile = Profile {
            id,
            user_id,
            webhook_token: webhook_token.to_string(),
            create_date: Some(Utc::now()),
        };
        inner.profiles.push(profile.clone());
        profile
    }

    pub fn projects(&self) -> Vec<Project> {
        self.inner.lock().unwrap().projects.clone()
    }

    pub fn pipelines(&self) -> Vec<Pipeline> {
        self.inner.lock().unwrap().pipelines.clone()
    }

    pub fn deployments(&self) -> Vec<Deployment> {
        self.inner.lock().unwrap().deployments.clone()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn profile_by_token(&self, token: &str) -> anyhow::Result<Option<Profile>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .profiles
            .iter()
            .find(|p| p.webhook_token == token)
            .cloned())
    }

    async fn sole_profile(&self) -> anyhow::Result<Option<Profile>> {
        let inner = self.inner.lock().unwrap();
        match inner.profiles.as_slice() {
            [only] => Ok(Some(only.clone())),
            _ => Ok(None),
        }
    }

    async fn project_by_name(
        &self,
        name: &str,
        owner: Option<Uuid>,
    ) -> anyhow::Result<Option<Project>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .projects
            .iter()
            .find(|p| p.name == name && owner.is_none_or(|o| p.created_by == o))
            .cloned())
    }

    async fn create_project(&self, new_project: NewProject) -> anyhow::Result<Project> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(existing) = inner
            .projects
            .iter()
            .find(|p| p.name == new_project.name && p.created_by == new_project.created_by)
        {
            return Ok(existing.clone());
        }

        let id = inner.next_id();
        let project = Project {
            id,
            name: new_project.name,
            repository_url: new_project.repository_url,
            created_by: new_project.created_by,
            create_date: Some(Utc::now()),
        };
        inner.projects.push(project.clone());
        Ok(project)
    }

    async fn pipeline_by_run_number(
        &self,
        project_id: i64,
        run_number: i64,
    ) -> anyhow::Result<Option<Pipeline>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .pipelines
            .iter()
            .find(|p| p.project_id == project_id && p.run_number == run_number)
            .cloned())
    }

    async fn upsert_pipeline(&self, new_pipeline: NewPipeline) -> anyhow::Result<Pipeline> {
        let mut inner = self.inner.lock().unwrap();
        let now = Utc::now();

        if let Some(existing) = inner.pipelines.iter_mut().find(|p| {
            p.project_id == new_pipeline.project_id && p.run_number == new_pipeline.run_number
        }) {
            existing.status = new_pipeline.status;
            existing.duration_seconds = new_pipeline.duration_seconds;
            existing.completed_at = new_pipeline.completed_at;
            existing.write_date = Some(now);
            return Ok(existing.clone());
        }

        let id = inner.next_id();
        let pipeline = Pipeline {
            id,
            project_id: new_pipeline.project_id,
            run_number: new_pipeline.run_number,
            branch: new_pipeline.branch,
            commit_hash: new_pipeline.commit_hash,
            status: new_pipeline.status,
            duration_seconds: new_pipeline.duration_seconds,
            triggered_by: new_pipeline.triggered_by,
            started_at: new_pipeline.started_at,
            completed_at: new_pipeline.completed_at,
            create_date: Some(now),
            write_date: Some(now),
        };
        inner.pipelines.push(pipeline.clone());
        Ok(pipeline)
    }

    async fn insert_deployment(&self, new_deployment: NewDeployment) -> anyhow::Result<Deployment> {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.next_id();
        let deployment = Deployment {
            id,
            project_id: new_deployment.project_id,
            pipeline_id: new_deployment.pipeline_id,
            environment: new_deployment.environment,
            version: new_deployment.version,
            status: new_deployment.status,
            deployed_by: new_deployment.deployed_by,
            deployed_at: new_deployment.deployed_at,
            create_date: Some(Utc::now()),
        };
        inner.deployments.push(deployment.clone());
        Ok(deployment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_project(owner: Uuid) -> NewProject {
        NewProject {
            name: "new-repo".to_string(),
            repository_url: None,
            created_by: owner,
        }
    }

    fn new_pipeline(project_id: i64, status: &str) -> NewPipeline {
        NewPipeline {
            project_id,
            run_number: 7,
            branch: "main".to_string(),
            commit_hash: "0a1b2c3d".to_string(),
            status: status.to_string(),
            duration_seconds: None,
            triggered_by: Uuid::new_v4(),
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    #[tokio::test]
    async fn racing_project_creation_resolves_to_one_row() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();

        // Both callers observed "absent" before either inserted.
        let first = store.create_project(new_project(owner)).await.unwrap();
        let second = store.create_project(new_project(owner)).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(store.projects().len(), 1);
    }

    #[tokio::test]
    async fn same_name_under_different_owners_is_two_projects() {
        let store = MemoryStore::new();

        store.create_project(new_project(Uuid::new_v4())).await.unwrap();
        store.create_project(new_project(Uuid::new_v4())).await.unwrap();

        assert_eq!(store.projects().len(), 2);
    }

    #[tokio::test]
    async fn upsert_keeps_first_events_immutable_fields() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let project = store.create_project(new_project(owner)).await.unwrap();

        let inserted = store
            .upsert_pipeline(new_pipeline(project.id, "pending"))
            .await
            .unwrap();

        let mut update = new_pipeline(project.id, "success");
        update.branch = "other".to_string();
        update.duration_seconds = Some(125);
        update.completed_at = Some(Utc::now());
        let updated = store.upsert_pipeline(update).await.unwrap();

        assert_eq!(updated.id, inserted.id);
        assert_eq!(store.pipelines().len(), 1);
        assert_eq!(updated.branch, "main");
        assert_eq!(updated.status, "success");
        assert_eq!(updated.duration_seconds, Some(125));
        assert!(updated.completed_at.is_some());
    }
}

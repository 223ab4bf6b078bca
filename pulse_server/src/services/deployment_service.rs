//! Deployment recording — always insert, never upsert.

use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::models::deployment::{Deployment, NewDeployment};
use crate::schema::deployments;

/// Insert a deployment record.
pub async fn insert(
    conn: &mut AsyncPgConnection,
    new_deployment: NewDeployment,
) -> anyhow::Result<Deployment> {
    let result = diesel::insert_into(deployments::table)
        .values(&new_deployment)
        .get_result::<Deployment>(conn)
        .await?;

    tracing::info!(
        deployment_id = result.id,
        project_id = result.project_id,
        environment = %result.environment,
        "Deployment recorded"
    );

    Ok(result)
}

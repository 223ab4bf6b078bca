//! Project lookup and conflict-safe lazy creation.

use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use uuid::Uuid;

use crate::models::project::{NewProject, Project};
use crate::schema::projects;

/// Find a project by name, optionally scoped to an owning account.
pub async fn find_by_name(
    conn: &mut AsyncPgConnection,
    name: &str,
    owner: Option<Uuid>,
) -> anyhow::Result<Option<Project>> {
    let mut query = projects::table.filter(projects::name.eq(name)).into_boxed();
    if let Some(owner) = owner {
        query = query.filter(projects::created_by.eq(owner));
    }

    let result = query.first::<Project>(conn).await.optional()?;
    Ok(result)
}

/// Create a project, tolerating concurrent creation of the same
/// (name, owner): the unique constraint swallows the duplicate insert and
/// the existing row is re-read.
pub async fn create(
    conn: &mut AsyncPgConnection,
    new_project: NewProject,
) -> anyhow::Result<Project> {
    let inserted = diesel::insert_into(projects::table)
        .values(&new_project)
        .on_conflict_do_nothing()
        .get_result::<Project>(conn)
        .await
        .optional()?;

    match inserted {
        Some(project) => {
            tracing::info!(project_id = project.id, name = %project.name, "Project created");
            Ok(project)
        }
        None => {
            // Another request created it between our lookup and this insert.
            let existing = projects::table
                .filter(projects::name.eq(&new_project.name))
                .filter(projects::created_by.eq(new_project.created_by))
                .first::<Project>(conn)
                .await?;
            Ok(existing)
        }
    }
}

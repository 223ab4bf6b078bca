//! Pipeline run upsert keyed on (project, run_number).

use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::models::pipeline::{NewPipeline, Pipeline};
use crate::schema::pipelines;

/// Find a pipeline run by its provider-native run number.
pub async fn find_by_run_number(
    conn: &mut AsyncPgConnection,
    project_id: i64,
    run_number: i64,
) -> anyhow::Result<Option<Pipeline>> {
    let result = pipelines::table
        .filter(pipelines::project_id.eq(project_id))
        .filter(pipelines::run_number.eq(run_number))
        .first::<Pipeline>(conn)
        .await
        .optional()?;
    Ok(result)
}

/// Insert a pipeline run, or update it in place when the run number already
/// exists for the project.
///
/// Only status, duration and completion move on update; branch, commit and
/// trigger keep their values from the first event, since the same run
/// number is the same logical run across its lifecycle.
pub async fn upsert(
    conn: &mut AsyncPgConnection,
    new_pipeline: NewPipeline,
) -> anyhow::Result<Pipeline> {
    use diesel::upsert::excluded;

    let result = diesel::insert_into(pipelines::table)
        .values(&new_pipeline)
        .on_conflict((pipelines::project_id, pipelines::run_number))
        .do_update()
        .set((
            pipelines::status.eq(excluded(pipelines::status)),
            pipelines::duration_seconds.eq(excluded(pipelines::duration_seconds)),
            pipelines::completed_at.eq(excluded(pipelines::completed_at)),
            pipelines::write_date.eq(Some(chrono::Utc::now())),
        ))
        .get_result::<Pipeline>(conn)
        .await?;

    Ok(result)
}

//! Embedded SQL migration for the dashboard schema.

use diesel_async::{AsyncPgConnection, SimpleAsyncConnection};

/// SQL migration for the Pulse dashboard tables.
///
/// The UNIQUE constraints are load-bearing: projects(name, created_by)
/// absorbs concurrent first-event creation races, and
/// pipelines(project_id, run_number) is the upsert key that makes event
/// replay idempotent.
pub const MIGRATION_SQL: &str = r#"
-- ================================================================
-- Pulse Dashboard Tables
-- ================================================================

CREATE TABLE IF NOT EXISTS profiles (
    id              BIGSERIAL PRIMARY KEY,
    user_id         UUID NOT NULL UNIQUE,
    webhook_token   VARCHAR(64) NOT NULL UNIQUE,
    create_date     TIMESTAMPTZ DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_profiles_token ON profiles (webhook_token);

CREATE TABLE IF NOT EXISTS projects (
    id              BIGSERIAL PRIMARY KEY,
    name            VARCHAR(255) NOT NULL,
    repository_url  VARCHAR(500),
    created_by      UUID NOT NULL,
    create_date     TIMESTAMPTZ DEFAULT NOW(),
    UNIQUE (name, created_by)
);

CREATE INDEX IF NOT EXISTS idx_projects_name ON projects (name);

CREATE TABLE IF NOT EXISTS pipelines (
    id              BIGSERIAL PRIMARY KEY,
    project_id      BIGINT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    run_number      BIGINT NOT NULL,
    branch          VARCHAR(255) NOT NULL,
    commit_hash     VARCHAR(40) NOT NULL,
    status          VARCHAR(16) NOT NULL DEFAULT 'pending',
    duration_seconds INTEGER,
    triggered_by    UUID NOT NULL,
    started_at      TIMESTAMPTZ NOT NULL,
    completed_at    TIMESTAMPTZ,
    create_date     TIMESTAMPTZ DEFAULT NOW(),
    write_date      TIMESTAMPTZ DEFAULT NOW(),
    UNIQUE (project_id, run_number)
);

CREATE INDEX IF NOT EXISTS idx_pipelines_project ON pipelines (project_id);
CREATE INDEX IF NOT EXISTS idx_pipelines_status ON pipelines (status);
CREATE INDEX IF NOT EXISTS idx_pipelines_started ON pipelines (started_at DESC);

CREATE TABLE IF NOT EXISTS deployments (
    id              BIGSERIAL PRIMARY KEY,
    project_id      BIGINT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    pipeline_id     BIGINT REFERENCES pipelines(id),
    environment     VARCHAR(16) NOT NULL,
    version         VARCHAR(255) NOT NULL,
    status          VARCHAR(16) NOT NULL,
    deployed_by     UUID NOT NULL,
    deployed_at     TIMESTAMPTZ NOT NULL,
    create_date     TIMESTAMPTZ DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_deployments_project ON deployments (project_id);
CREATE INDEX IF NOT EXISTS idx_deployments_environment ON deployments (environment);
CREATE INDEX IF NOT EXISTS idx_deployments_deployed ON deployments (deployed_at DESC);
"#;

/// Run the dashboard schema migration.
pub async fn run_migration(conn: &mut AsyncPgConnection) -> anyhow::Result<()> {
    conn.batch_execute(MIGRATION_SQL)
        .await
        .map_err(|e| anyhow::anyhow!("schema migration failed: {e}"))?;
    Ok(())
}

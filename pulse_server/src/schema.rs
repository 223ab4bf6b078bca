//! Diesel table definitions for the Pulse dashboard schema.
//!
//! Tables: profiles, projects, pipelines, deployments.
//! The uniqueness constraints on (name, created_by) and
//! (project_id, run_number) back the idempotent ingestion path.

diesel::table! {
    profiles (id) {
        id -> Int8,
        user_id -> Uuid,
        webhook_token -> Varchar,
        create_date -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    projects (id) {
        id -> Int8,
        name -> Varchar,
        repository_url -> Nullable<Varchar>,
        created_by -> Uuid,
        create_date -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    pipelines (id) {
        id -> Int8,
        project_id -> Int8,
        run_number -> Int8,
        branch -> Varchar,
        commit_hash -> Varchar,
        status -> Varchar,
        duration_seconds -> Nullable<Int4>,
        triggered_by -> Uuid,
        started_at -> Timestamptz,
        completed_at -> Nullable<Timestamptz>,
        create_date -> Nullable<Timestamptz>,
        write_date -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    deployments (id) {
        id -> Int8,
        project_id -> Int8,
        pipeline_id -> Nullable<Int8>,
        environment -> Varchar,
        version -> Varchar,
        status -> Varchar,
        deployed_by -> Uuid,
        deployed_at -> Timestamptz,
        create_date -> Nullable<Timestamptz>,
    }
}

// Foreign key relationships
diesel::joinable!(pipelines -> projects (project_id));
diesel::joinable!(deployments -> projects (project_id));
diesel::joinable!(deployments -> pipelines (pipeline_id));

diesel::allow_tables_to_appear_in_same_query!(profiles, projects, pipelines, deployments);

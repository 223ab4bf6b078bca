//! Persistence queries, one module per table.

pub mod deployment_service;
pub mod pipeline_service;
pub mod profile_service;
pub mod project_service;

//! Canonical status vocabulary shared by all provider adapters.

use serde::{Deserialize, Serialize};

/// Unified pipeline/deployment status.
///
/// Every provider-native vocabulary maps onto this closed set; provider
/// states with no defined target map to `Failed`, never get dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineStatus {
    Pending,
    Running,
    Success,
    Failed,
    Cancelled,
}

impl PipelineStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStatus::Pending => "pending",
            PipelineStatus::Running => "running",
            PipelineStatus::Success => "success",
            PipelineStatus::Failed => "failed",
            PipelineStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for PipelineStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deployment target environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeployEnvironment {
    Production,
    Staging,
    Development,
}

impl DeployEnvironment {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeployEnvironment::Production => "production",
            DeployEnvironment::Staging => "staging",
            DeployEnvironment::Development => "development",
        }
    }
}

impl std::fmt::Display for DeployEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

//! Request/response DTOs for run endpoints.

use serde::{Deserialize, Serialize};

use crate::domain::dialog::{DialogState, RunOptions};
use crate::domain::foundation::RunId;
use crate::domain::guidelines::Guidelines;
use crate::domain::subject::Facts;

/// Body of `POST /api/runs`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRunRequest {
    /// Scenario label; defaults to screening eligibility.
    #[serde(default = "default_scenario")]
    pub scenario: String,
    /// Inline facts for the subject under review; wins over `subjectId`.
    pub facts: Option<Facts>,
    /// External subject identifier, resolved through the facts provider.
    pub subject_id: Option<String>,
    /// Explicit guidelines; omit to use the stored default version.
    pub guidelines: Option<Guidelines>,
    /// Run options; omit for defaults.
    pub options: Option<RunOptions>,
}

fn default_scenario() -> String {
    "screening-eligibility".to_string()
}

/// Body of the start response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRunResponse {
    pub run_id: RunId,
}

/// Body of the cancel acknowledgement.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelRunResponse {
    pub run_id: RunId,
    pub state: DialogState,
}

/// Body of `POST /api/runs/cleanup`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupRequest {
    pub max_age_secs: u64,
}

/// Body of the cleanup response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupResponse {
    pub removed: usize,
}

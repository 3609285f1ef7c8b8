use serde::{Deserialize, Serialize};

use crate::domain::{Candidate, Job, Stage, StageId};

/// Body of `GET /jobs/{jobId}/pipeline`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineResponse {
    pub job: Job,
    #[serde(default)]
    pub stages: Vec<Stage>,
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

/// Body of `PATCH /candidates/{candidateId}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCandidateStageRequest {
    pub stage_id: StageId,
}

use shared::domain::{CandidateId, JobId, StageId};

/// Notifications for toasts, banners and logs. Delivery is best-effort.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    Loaded {
        job_id: JobId,
        revision: u64,
    },
    LoadFailed {
        job_id: JobId,
        message: String,
    },
    MoveStarted {
        candidate_id: CandidateId,
        stage_id: StageId,
    },
    MoveSucceeded {
        candidate_id: CandidateId,
        stage_id: StageId,
    },
    MoveFailed {
        candidate_id: CandidateId,
        stage_id: StageId,
        message: String,
    },
}

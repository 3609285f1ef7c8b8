use shared::domain::CandidateId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server responded {status}: {message}")]
    Status { status: u16, message: String },
    #[error("malformed server response: {0}")]
    Decode(String),
    #[error("invalid api base url '{0}'")]
    InvalidBaseUrl(String),
    #[error("candidate {0} is not part of the loaded pipeline")]
    UnknownCandidate(CandidateId),
    /// Returned by [`ReloadHook`](crate::data_source::ReloadHook) implementations
    /// whose own reload failed. `reconcile` passes it through unchanged.
    #[error("reload failed: {0}")]
    Reload(String),
}

impl PipelineError {
    /// Transport failures and 5xx/429 responses may succeed on retry; 4xx rejections will not.
    pub fn is_retryable(&self) -> bool {
        match self {
            PipelineError::Transport(_) | PipelineError::Reload(_) => true,
            PipelineError::Status { status, .. } => *status >= 500 || *status == 429,
            PipelineError::Decode(_)
            | PipelineError::InvalidBaseUrl(_)
            | PipelineError::UnknownCandidate(_) => false,
        }
    }
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;

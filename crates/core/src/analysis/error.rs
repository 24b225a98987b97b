use shelfsight_domain::{JobStatus, ShelfSightError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("No ROIs are saved for this video")]
    NoRoisForVideo,

    #[error("An analysis job is already running for this video")]
    JobAlreadyActive,

    /// Previous job ended; only a reset leaves a terminal state.
    #[error("Analysis job is {status}; reset it before starting again")]
    ResetRequired { status: JobStatus },

    #[error("Failed to start analysis: {reason}")]
    StartFailed { reason: String },

    #[error("Analysis job is {status}, not analyzing")]
    NotAnalyzing { status: JobStatus },

    /// A reset raced the start request; its response was discarded.
    #[error("Analysis start was cancelled by a reset")]
    StartCancelled,
}

impl From<AnalysisError> for ShelfSightError {
    fn from(err: AnalysisError) -> Self {
        match err {
            AnalysisError::StartFailed { .. } => Self::Network(err.to_string()),
            AnalysisError::NoRoisForVideo
            | AnalysisError::JobAlreadyActive
            | AnalysisError::ResetRequired { .. }
            | AnalysisError::NotAnalyzing { .. }
            | AnalysisError::StartCancelled => Self::Precondition(err.to_string()),
        }
    }
}

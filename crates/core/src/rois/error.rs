use shelfsight_domain::ShelfSightError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoiError {
    /// Local validation or transport failure; staging is left intact.
    #[error("Failed to persist ROIs: {reason}")]
    PersistFailure { reason: String },
}

impl From<RoiError> for ShelfSightError {
    fn from(err: RoiError) -> Self {
        match err {
            RoiError::PersistFailure { .. } => Self::Network(err.to_string()),
        }
    }
}

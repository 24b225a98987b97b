use shelfsight_domain::constants::MIN_POLYGON_POINTS;
use shelfsight_domain::ShelfSightError;
use thiserror::Error;

/// Errors raised by [`super::GeometryCapture`]. All are recoverable locally;
/// none of them mutate capture state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    /// Reference frame not decoded yet or has zero dimensions
    #[error("Reference frame is not ready for drawing")]
    FrameNotReady,

    #[error("Drawing mode is not active")]
    NotCapturing,

    /// The open polygon is closed and waiting for a name
    #[error("Polygon is awaiting a name; commit or cancel first")]
    AwaitingName,

    #[error("A polygon needs at least {MIN_POLYGON_POINTS} points (found {found})")]
    InsufficientPoints { found: usize },

    #[error("No closed polygon is awaiting a name")]
    NotAwaitingName,

    #[error("Polygon name must not be empty")]
    EmptyName,
}

impl From<CaptureError> for ShelfSightError {
    fn from(err: CaptureError) -> Self {
        match err {
            CaptureError::EmptyName | CaptureError::InsufficientPoints { .. } => {
                Self::Validation(err.to_string())
            }
            CaptureError::FrameNotReady
            | CaptureError::NotCapturing
            | CaptureError::AwaitingName
            | CaptureError::NotAwaitingName => Self::Precondition(err.to_string()),
        }
    }
}

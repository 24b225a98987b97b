//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for ShelfSight
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum ShelfSightError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad geometry, empty names, rejected upload candidates.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Operation rejected before any network call was made.
    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ShelfSightError {
    /// True for transport-level failures that a later attempt may cure.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

/// Result type alias for ShelfSight operations
pub type Result<T> = std::result::Result<T, ShelfSightError>;

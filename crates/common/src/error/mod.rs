//! Error classification shared by every ShelfSight error type
//!
//! Module-specific errors stay precise (`thiserror` enums owned by each
//! module). What they share is a way to answer two questions uniformly:
//!
//! 1. Is another attempt likely to succeed? (`is_retryable`)
//! 2. How loudly should this be reported? (`severity`)
//!
//! ```rust
//! use shelfsight_common::{ErrorClassification, ErrorSeverity};
//!
//! enum FetchError {
//!     Offline,
//!     Rejected,
//! }
//!
//! impl ErrorClassification for FetchError {
//!     fn is_retryable(&self) -> bool {
//!         matches!(self, Self::Offline)
//!     }
//!
//!     fn severity(&self) -> ErrorSeverity {
//!         match self {
//!             Self::Offline => ErrorSeverity::Warning,
//!             Self::Rejected => ErrorSeverity::Error,
//!         }
//!     }
//! }
//!
//! assert!(FetchError::Offline.is_retryable());
//! assert_eq!(FetchError::Rejected.severity(), ErrorSeverity::Error);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// Standard interface for classifying errors
pub trait ErrorClassification {
    /// Transient failures (timeouts, connection resets, 5xx) that may succeed
    /// on a later attempt.
    fn is_retryable(&self) -> bool;

    /// Severity used for log level selection.
    fn severity(&self) -> ErrorSeverity;
}

/// Error severity levels for monitoring and alerting
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ErrorSeverity {
    /// Informational, typically for debugging
    Info,
    /// Warning, should be monitored but not critical
    Warning,
    /// Error, requires attention and action
    Error,
    /// Critical, immediate action required
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

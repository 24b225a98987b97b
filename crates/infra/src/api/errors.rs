//! Backend API error types
//!
//! Provides error classification for backend calls: retryability and the
//! severity that selects the log level of a failed call.

use std::time::Duration;

use reqwest::StatusCode;
use shelfsight_common::{ErrorClassification, ErrorSeverity};
use shelfsight_domain::ShelfSightError;
use thiserror::Error;

/// Categories of API errors for retry logic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorCategory {
    /// Server errors (5xx) - retryable
    Server,
    /// Client errors (4xx except 404) - non-retryable
    Client,
    /// Unknown video or session - non-retryable
    NotFound,
    /// Network/connection errors - retryable
    Network,
    /// Request exceeded its deadline - retryable
    Timeout,
    /// Configuration errors - non-retryable
    Config,
    /// Response body did not match the expected shape - non-retryable
    Decode,
}

/// Backend call errors
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Server error ({status}) at {url}: {message}")]
    Server { status: u16, url: String, message: String },

    #[error("Client error ({status}) at {url}: {message}")]
    Client { status: u16, url: String, message: String },

    #[error("Not found at {url}: {message}")]
    NotFound { url: String, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unexpected response from {url}: {message}")]
    Decode { url: String, message: String },
}

impl ApiError {
    /// Get the error category for this error
    pub fn category(&self) -> ApiErrorCategory {
        match self {
            Self::Server { .. } => ApiErrorCategory::Server,
            Self::Client { .. } => ApiErrorCategory::Client,
            Self::NotFound { .. } => ApiErrorCategory::NotFound,
            Self::Network(_) => ApiErrorCategory::Network,
            Self::Timeout(_) => ApiErrorCategory::Timeout,
            Self::Config(_) => ApiErrorCategory::Config,
            Self::Decode { .. } => ApiErrorCategory::Decode,
        }
    }

    /// Check if this error should be retried
    pub fn should_retry(&self) -> bool {
        matches!(
            self.category(),
            ApiErrorCategory::Server | ApiErrorCategory::Network | ApiErrorCategory::Timeout
        )
    }
}

impl ErrorClassification for ApiError {
    fn is_retryable(&self) -> bool {
        self.should_retry()
    }

    fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ApiErrorCategory::NotFound => ErrorSeverity::Info,
            ApiErrorCategory::Network | ApiErrorCategory::Timeout => ErrorSeverity::Warning,
            ApiErrorCategory::Server | ApiErrorCategory::Client | ApiErrorCategory::Decode => {
                ErrorSeverity::Error
            }
            ApiErrorCategory::Config => ErrorSeverity::Critical,
        }
    }
}

impl From<ApiError> for ShelfSightError {
    fn from(err: ApiError) -> Self {
        let message = err.to_string();
        match err.category() {
            ApiErrorCategory::NotFound => Self::NotFound(message),
            ApiErrorCategory::Client => Self::Validation(message),
            ApiErrorCategory::Config => Self::Config(message),
            ApiErrorCategory::Server
            | ApiErrorCategory::Network
            | ApiErrorCategory::Timeout
            | ApiErrorCategory::Decode => Self::Network(message),
        }
    }
}

/// Map a non-success HTTP status into an [`ApiError`].
///
/// The backend reports failures as `{"detail": ...}` or `{"message": ...}`;
/// either is preferred over the raw body.
pub fn map_status_error(status: StatusCode, url: &str, body: &str) -> ApiError {
    let message = extract_message(body).unwrap_or_else(|| {
        if body.trim().is_empty() {
            status.canonical_reason().unwrap_or("unknown status").to_string()
        } else {
            body.trim().to_string()
        }
    });
    let url = url.to_string();
    let code = status.as_u16();

    match status {
        StatusCode::NOT_FOUND => ApiError::NotFound { url, message },
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => ApiError::Server { status: code, url, message },
        s if s.is_server_error() => ApiError::Server { status: code, url, message },
        s if s.is_client_error() => ApiError::Client { status: code, url, message },
        _ => ApiError::Decode { url, message: format!("unexpected status {code}: {message}") },
    }
}

fn extract_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["detail", "message", "error"].iter().find_map(|key| match value.get(key)? {
        serde_json::Value::String(text) => Some(text.clone()),
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    })
}

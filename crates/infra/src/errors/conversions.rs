//! Conversions from external infrastructure errors into domain errors.

use std::io::{Error as IoError, ErrorKind};

use image::ImageError;
use reqwest::Error as HttpError;
use serde_json::Error as JsonError;
use shelfsight_domain::ShelfSightError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub ShelfSightError);

impl From<InfraError> for ShelfSightError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<ShelfSightError> for InfraError {
    fn from(value: ShelfSightError) -> Self {
        Self(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoShelfSightError {
    fn into_shelfsight(self) -> ShelfSightError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → ShelfSightError */
/* -------------------------------------------------------------------------- */

impl IntoShelfSightError for HttpError {
    fn into_shelfsight(self) -> ShelfSightError {
        if self.is_timeout() {
            return ShelfSightError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return ShelfSightError::Network("HTTP connection failure".into());
        }

        if self.is_decode() {
            return ShelfSightError::Network(format!("HTTP response could not be decoded: {self}"));
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                404 => ShelfSightError::NotFound(message),
                400..=499 if code != 408 && code != 429 => ShelfSightError::Validation(message),
                _ => ShelfSightError::Network(message),
            };
        }

        if self.is_builder() {
            return ShelfSightError::Config(format!("invalid HTTP request: {self}"));
        }

        ShelfSightError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        Self(value.into_shelfsight())
    }
}

/* -------------------------------------------------------------------------- */
/* std::io::Error → ShelfSightError */
/* -------------------------------------------------------------------------- */

impl IntoShelfSightError for IoError {
    fn into_shelfsight(self) -> ShelfSightError {
        match self.kind() {
            ErrorKind::NotFound => ShelfSightError::NotFound(self.to_string()),
            ErrorKind::PermissionDenied => {
                ShelfSightError::Precondition(format!("permission denied: {self}"))
            }
            _ => ShelfSightError::Internal(format!("I/O error: {self}")),
        }
    }
}

impl From<IoError> for InfraError {
    fn from(value: IoError) -> Self {
        Self(value.into_shelfsight())
    }
}

/* -------------------------------------------------------------------------- */
/* serde_json::Error → ShelfSightError */
/* -------------------------------------------------------------------------- */

impl IntoShelfSightError for JsonError {
    fn into_shelfsight(self) -> ShelfSightError {
        ShelfSightError::Internal(format!("JSON error at line {}: {self}", self.line()))
    }
}

impl From<JsonError> for InfraError {
    fn from(value: JsonError) -> Self {
        Self(value.into_shelfsight())
    }
}

/* -------------------------------------------------------------------------- */
/* image::ImageError → ShelfSightError */
/* -------------------------------------------------------------------------- */

impl IntoShelfSightError for ImageError {
    fn into_shelfsight(self) -> ShelfSightError {
        match self {
            ImageError::IoError(err) => err.into_shelfsight(),
            other => ShelfSightError::Render(other.to_string()),
        }
    }
}

impl From<ImageError> for InfraError {
    fn from(value: ImageError) -> Self {
        Self(value.into_shelfsight())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */

//! Local checks run before an upload starts.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::json;
use shelfsight_common::DiagnosticsLog;
use shelfsight_domain::{ShelfSightError, UploadConfig};

const CATEGORY: &str = "VIDEO_VALIDATOR";
const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;

/// A file the operator picked for upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoCandidate {
    pub name: String,
    pub size_bytes: u64,
    /// `None` when the type could not be detected.
    pub mime_type: Option<String>,
}

impl VideoCandidate {
    /// Build from a path and its length, guessing the MIME type from the
    /// extension.
    pub fn from_path(path: &Path, size_bytes: u64) -> Self {
        let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        let mime_type = guess_mime(&extension_of(&name)).map(str::to_string);
        Self { name, size_bytes, mime_type }
    }
}

/// MIME type for a lowercase dotted extension such as `.mov`.
pub fn guess_mime(extension: &str) -> Option<&'static str> {
    match extension {
        ".mp4" | ".m4v" => Some("video/mp4"),
        ".mov" => Some("video/quicktime"),
        ".avi" => Some("video/x-msvideo"),
        ".mkv" => Some("video/x-matroska"),
        ".webm" => Some("video/webm"),
        _ => None,
    }
}

fn extension_of(name: &str) -> String {
    name.rfind('.').map(|index| name[index..].to_lowercase()).unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileInfo {
    pub name: String,
    pub size: u64,
    pub mime_type: Option<String>,
    /// Lowercase, with leading dot; empty when absent.
    pub extension: String,
    pub size_mb: f64,
}

/// Verdict of [`UploadValidator::validate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub file_info: FileInfo,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// # Errors
    /// [`ShelfSightError::Validation`] joining every error message.
    pub fn ensure_valid(&self) -> Result<(), ShelfSightError> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(ShelfSightError::Validation(self.errors.join("; ")))
        }
    }
}

/// Applies [`UploadConfig`] limits and records each verdict.
#[derive(Debug, Clone)]
pub struct UploadValidator {
    limits: UploadConfig,
    diagnostics: Option<DiagnosticsLog>,
}

impl UploadValidator {
    pub fn new(limits: UploadConfig) -> Self {
        Self { limits, diagnostics: None }
    }

    #[must_use]
    pub fn with_diagnostics(mut self, diagnostics: DiagnosticsLog) -> Self {
        self.diagnostics = Some(diagnostics);
        self
    }

    pub fn limits(&self) -> &UploadConfig {
        &self.limits
    }

    pub fn validate(&self, candidate: &VideoCandidate) -> ValidationReport {
        let extension = extension_of(&candidate.name);
        #[allow(clippy::cast_precision_loss)]
        let size_mb = (candidate.size_bytes as f64 / BYTES_PER_MIB * 100.0).round() / 100.0;
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if candidate.name.trim().is_empty() {
            errors.push("File name is empty".to_string());
        }
        if candidate.size_bytes == 0 {
            errors.push("File is empty".to_string());
        }

        match candidate.mime_type.as_deref() {
            None | Some("") => warnings.push("File MIME type could not be detected".to_string()),
            Some(mime) if !self.limits.allowed_mime_types.iter().any(|allowed| allowed == mime) => {
                errors.push(format!(
                    "Unsupported format: {mime}. Accepted formats: {}",
                    self.limits.allowed_mime_types.join(", ")
                ));
            }
            Some(_) => {}
        }

        if candidate.size_bytes > self.limits.max_bytes {
            errors.push(format!(
                "File too large: {size_mb}MB. Maximum size: {}MB",
                self.limits.max_bytes / (1024 * 1024)
            ));
        }
        if candidate.size_bytes < self.limits.min_bytes {
            errors.push(format!(
                "File too small: {} bytes. Minimum size: {} bytes",
                candidate.size_bytes, self.limits.min_bytes
            ));
        }
        if candidate.size_bytes > self.limits.large_file_warning_bytes {
            warnings.push("Large file may take a while to upload".to_string());
        }

        if extension.is_empty() {
            errors.push("File has no extension".to_string());
        } else if !self.limits.allowed_extensions.iter().any(|allowed| allowed.eq_ignore_ascii_case(&extension)) {
            errors.push(format!(
                "Unsupported extension: {extension}. Accepted extensions: {}",
                self.limits.allowed_extensions.join(", ")
            ));
        }
        if extension == ".mp4" && candidate.mime_type.as_deref().is_some_and(|mime| !mime.contains("mp4")) {
            warnings.push("Extension .mp4 does not match the detected MIME type".to_string());
        }

        let report = ValidationReport {
            errors,
            warnings,
            file_info: FileInfo {
                name: candidate.name.clone(),
                size: candidate.size_bytes,
                mime_type: candidate.mime_type.clone(),
                extension,
                size_mb,
            },
        };
        self.record(&report);
        report
    }

    fn record(&self, report: &ValidationReport) {
        let Some(diagnostics) = &self.diagnostics else {
            return;
        };
        let data = json!({
            "fileName": report.file_info.name,
            "errors": report.errors,
            "warnings": report.warnings,
        });
        if report.is_valid() {
            diagnostics.info(CATEGORY, "File accepted", Some(data));
        } else {
            diagnostics.error(CATEGORY, "File rejected", Some(data));
        }
    }
}

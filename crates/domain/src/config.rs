//! Configuration structures
//!
//! Every section carries `#[serde(default)]` so partial JSON/TOML files only
//! need to name the values they override.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_API_URL, DIAGNOSTICS_CAPACITY, JOB_DEADLINE_SECS, LARGE_UPLOAD_WARNING_BYTES,
    MAX_UPLOAD_BYTES, METADATA_TIMEOUT_SECS, MIN_UPLOAD_BYTES, MUTATION_TIMEOUT_SECS,
    POLL_INTERVAL_SECS, SUPPORTED_VIDEO_EXTENSIONS, SUPPORTED_VIDEO_MIME_TYPES,
    UPLOAD_TIMEOUT_SECS,
};

/// Top-level application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub analysis: AnalysisConfig,
    pub diagnostics: DiagnosticsConfig,
    pub upload: UploadConfig,
}

/// Backend API connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// Listing calls (`/get-rois`, `/get-videos`)
    pub metadata_timeout_secs: u64,
    /// Mutations (`/rois`, `/analyze-behavior`, `/reset-analysis`)
    pub mutation_timeout_secs: u64,
    pub upload_timeout_secs: u64,
    pub max_attempts: usize,
    pub base_backoff_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            metadata_timeout_secs: METADATA_TIMEOUT_SECS,
            mutation_timeout_secs: MUTATION_TIMEOUT_SECS,
            upload_timeout_secs: UPLOAD_TIMEOUT_SECS,
            max_attempts: 3,
            base_backoff_ms: 200,
        }
    }
}

impl ApiConfig {
    pub fn metadata_timeout(&self) -> Duration {
        Duration::from_secs(self.metadata_timeout_secs)
    }

    pub fn mutation_timeout(&self) -> Duration {
        Duration::from_secs(self.mutation_timeout_secs)
    }

    pub fn upload_timeout(&self) -> Duration {
        Duration::from_secs(self.upload_timeout_secs)
    }

    pub fn base_backoff(&self) -> Duration {
        Duration::from_millis(self.base_backoff_ms)
    }
}

/// Analysis job polling settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub poll_interval_secs: u64,
    pub job_deadline_secs: u64,
    pub stop_join_timeout_ms: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: POLL_INTERVAL_SECS,
            job_deadline_secs: JOB_DEADLINE_SECS,
            stop_join_timeout_ms: 2_000,
        }
    }
}

impl AnalysisConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn job_deadline(&self) -> Duration {
        Duration::from_secs(self.job_deadline_secs)
    }

    pub fn stop_join_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_join_timeout_ms)
    }
}

/// In-memory diagnostics buffer settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    pub capacity: usize,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self { capacity: DIAGNOSTICS_CAPACITY }
    }
}

/// Local upload validation limits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub max_bytes: u64,
    pub min_bytes: u64,
    pub large_file_warning_bytes: u64,
    pub allowed_extensions: Vec<String>,
    pub allowed_mime_types: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_bytes: MAX_UPLOAD_BYTES,
            min_bytes: MIN_UPLOAD_BYTES,
            large_file_warning_bytes: LARGE_UPLOAD_WARNING_BYTES,
            allowed_extensions: SUPPORTED_VIDEO_EXTENSIONS.iter().map(ToString::to_string).collect(),
            allowed_mime_types: SUPPORTED_VIDEO_MIME_TYPES.iter().map(ToString::to_string).collect(),
        }
    }
}

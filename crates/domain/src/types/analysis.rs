//! Analysis job state, log events and backend payloads

use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::video::VideoId;
use crate::constants::COMPLETION_SENTINEL;
use crate::impl_domain_status_conversions;

/// Client-side lifecycle of one analysis job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    #[default]
    Idle,
    Starting,
    Analyzing,
    Completed,
    NotFound,
    TimedOut,
    Stopped,
}

impl_domain_status_conversions!(JobStatus {
    Idle => "idle",
    Starting => "starting",
    Analyzing => "analyzing",
    Completed => "completed",
    NotFound => "not_found",
    TimedOut => "timed_out",
    Stopped => "stopped",
});

impl JobStatus {
    /// A job in flight; a second start for the same video is rejected.
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Starting | Self::Analyzing)
    }

    /// Only `reset` leaves a terminal state.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::NotFound | Self::TimedOut | Self::Stopped)
    }
}

/// Kind of a streamed analysis event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogEventType {
    CustomerEntry,
    CustomerExit,
    ProductInteraction,
    #[default]
    Info,
    Error,
    #[serde(other)]
    Other,
}

impl_domain_status_conversions!(LogEventType {
    CustomerEntry => "customer_entry",
    CustomerExit => "customer_exit",
    ProductInteraction => "product_interaction",
    Info => "info",
    Error => "error",
    Other => "other",
});

/// Wall-clock time of receipt, `HH:MM:SS` in the local zone.
pub fn local_timestamp() -> String {
    Local::now().format("%H:%M:%S").to_string()
}

/// One entry of the job log, stamped at client receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
    pub timestamp: String,
    #[serde(rename = "type")]
    pub kind: LogEventType,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl LogEvent {
    pub fn new(kind: LogEventType, message: impl Into<String>) -> Self {
        Self { timestamp: local_timestamp(), kind, message: message.into(), details: None }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(LogEventType::Info, message)
    }

    /// Server timestamps are ignored; receipt order governs.
    pub fn received(entry: &RemoteLogEntry) -> Self {
        Self {
            timestamp: local_timestamp(),
            kind: entry.kind,
            message: entry.message.clone(),
            details: entry.details.clone(),
        }
    }
}

/// Log entry as produced by the analysis backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RemoteLogEntry {
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: LogEventType,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl RemoteLogEntry {
    pub fn new(kind: LogEventType, message: impl Into<String>) -> Self {
        Self { timestamp: None, kind, message: message.into(), details: None }
    }

    /// Whether the message text carries the end-of-job marker.
    pub fn carries_sentinel(&self) -> bool {
        self.message.contains(COMPLETION_SENTINEL)
    }
}

/// Running counters reported by the backend, stored verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AnalysisStats {
    pub total_customers: u64,
    pub product_interactions: u64,
}

impl AnalysisStats {
    /// Overwrite the fields present in `update`; absent fields keep their
    /// prior value.
    pub fn apply(&mut self, update: &StatsUpdate) {
        if let Some(total) = update.total_customers {
            self.total_customers = total;
        }
        if let Some(interactions) = update.product_interactions {
            self.product_interactions = interactions;
        }
    }
}

/// Partial stats snapshot carried by start/status responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StatsUpdate {
    #[serde(default)]
    pub total_customers: Option<u64>,
    #[serde(default)]
    pub product_interactions: Option<u64>,
}

/// Snapshot of a job as exposed to the UI layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisJob {
    pub video_id: VideoId,
    pub status: JobStatus,
    /// 0..=100
    pub progress_percent: f64,
    pub started_at_seconds: Option<i64>,
    pub duration_seconds_hint: Option<u64>,
    pub stats: AnalysisStats,
}

impl AnalysisJob {
    pub fn idle(video_id: VideoId) -> Self {
        Self {
            video_id,
            status: JobStatus::Idle,
            progress_percent: 0.0,
            started_at_seconds: None,
            duration_seconds_hint: None,
            stats: AnalysisStats::default(),
        }
    }
}

/// Response of `POST /analyze-behavior`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AnalysisStartResponse {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub initial_logs: Vec<RemoteLogEntry>,
    #[serde(default)]
    pub initial_stats: Option<StatsUpdate>,
    #[serde(default)]
    pub duration_seconds: Option<u64>,
    #[serde(default)]
    pub rois_count: Option<usize>,
}

impl AnalysisStartResponse {
    pub fn is_success(&self) -> bool {
        self.status.eq_ignore_ascii_case("success")
    }
}

/// `status` discriminator of `GET /analysis-status/{video}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RemoteJobState {
    Analyzing,
    Completed,
    NotFound,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Response of `GET /analysis-status/{video}`. Every field except `status`
/// is optional; which ones appear depends on the state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AnalysisStatusReport {
    #[serde(default)]
    pub status: RemoteJobState,
    #[serde(default)]
    pub new_logs: Option<Vec<RemoteLogEntry>>,
    #[serde(default)]
    pub new_log: Option<RemoteLogEntry>,
    #[serde(default)]
    pub updated_stats: Option<StatsUpdate>,
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub all_logs: Option<Vec<RemoteLogEntry>>,
    #[serde(default)]
    pub completion_log: Option<RemoteLogEntry>,
    #[serde(default)]
    pub final_stats: Option<StatsUpdate>,
    #[serde(default)]
    pub message: Option<String>,
}

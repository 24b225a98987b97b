//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! application.

// Backend API
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";
pub const METADATA_TIMEOUT_SECS: u64 = 10;
pub const MUTATION_TIMEOUT_SECS: u64 = 15;
pub const UPLOAD_TIMEOUT_SECS: u64 = 300;
pub const UPLOAD_FIELD_NAME: &str = "file";

// Analysis job orchestration
pub const POLL_INTERVAL_SECS: u64 = 3;
pub const JOB_DEADLINE_SECS: u64 = 600;
/// Substring inside a streamed log message that marks the end of a job.
pub const COMPLETION_SENTINEL: &str = "Total:";

// Polygon capture
pub const MIN_POLYGON_POINTS: usize = 3;
pub const DEFAULT_ROI_NAME_PREFIX: &str = "Shelf";

// Diagnostics
pub const DIAGNOSTICS_CAPACITY: usize = 1000;

// Upload validation
pub const MAX_UPLOAD_BYTES: u64 = 500 * 1024 * 1024;
pub const MIN_UPLOAD_BYTES: u64 = 1024;
pub const LARGE_UPLOAD_WARNING_BYTES: u64 = 100 * 1024 * 1024;
pub const SUPPORTED_VIDEO_EXTENSIONS: [&str; 3] = [".mp4", ".mov", ".avi"];
pub const SUPPORTED_VIDEO_MIME_TYPES: [&str; 3] = ["video/mp4", "video/quicktime", "video/x-msvideo"];

// Local job messages
pub const MSG_JOB_STOPPED: &str = "Behaviour analysis interrupted by the user";
pub const MSG_JOB_TIMED_OUT: &str = "Analysis interrupted by timeout";
pub const MSG_JOB_NOT_FOUND: &str = "Analysis session not found";
pub const MSG_JOB_COMPLETED: &str = "Behaviour analysis completed";

use std::time::Duration;

use serde_json::json;
use shelfsight_common::DiagnosticsLog;
use shelfsight_domain::ShelfSightError;
use tracing::{info, warn};

const COMMAND_CATEGORY: &str = "COMMAND";

/// Log the outcome of a command execution with structured fields.
///
/// `command` is a logical identifier such as `"analysis::start_analysis"`.
/// Callers must avoid forwarding sensitive values in it.
#[inline]
pub fn log_command_execution(command: &str, elapsed: Duration, success: bool, error_type: Option<&str>) {
    let duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);

    if success {
        info!(command, duration_ms, "command_execution_success");
    } else {
        warn!(command, duration_ms, error_type = error_type.unwrap_or("unknown"), "command_execution_failure");
    }
}

/// Convert a `ShelfSightError` into a stable label suitable for logging.
#[inline]
pub fn error_label(error: &ShelfSightError) -> &'static str {
    match error {
        ShelfSightError::Config(_) => "config",
        ShelfSightError::Network(_) => "network",
        ShelfSightError::NotFound(_) => "not_found",
        ShelfSightError::Validation(_) => "validation",
        ShelfSightError::Precondition(_) => "precondition",
        ShelfSightError::Render(_) => "render",
        ShelfSightError::Internal(_) => "internal",
    }
}

/// Keep failed commands in the diagnostics buffer for later export.
pub fn record_command_failure(diagnostics: &DiagnosticsLog, command: &str, error: &ShelfSightError) {
    diagnostics.error(
        COMMAND_CATEGORY,
        &format!("{command} failed"),
        Some(json!({ "error_type": error_label(error), "error": error.to_string() })),
    );
}

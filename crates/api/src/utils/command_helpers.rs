//! Command execution helpers
//!
//! Provides utilities to reduce boilerplate when implementing commands with
//! timing and logging.

use std::future::Future;
use std::time::Instant;

use shelfsight_domain::Result as DomainResult;

use crate::context::AppContext;
use crate::utils::logging::{error_label, log_command_execution, record_command_failure};

/// Execute a command with automatic timing and logging
///
/// Times the command, emits `command_execution_success` or
/// `command_execution_failure`, and records failures in the diagnostics
/// buffer.
///
/// # Example
///
/// ```rust,ignore
/// pub async fn list_videos(ctx: &AppContext) -> DomainResult<Vec<VideoInfo>> {
///     execute_command(ctx, "videos::list_videos", || ctx.videos.list()).await
/// }
/// ```
pub async fn execute_command<F, Fut, T>(ctx: &AppContext, command_name: &str, command_fn: F) -> DomainResult<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = DomainResult<T>>,
{
    let start = Instant::now();

    let result = command_fn().await;

    let elapsed = start.elapsed();
    let error_type = result.as_ref().err().map(error_label);
    log_command_execution(command_name, elapsed, result.is_ok(), error_type);
    if let Err(err) = &result {
        record_command_failure(&ctx.diagnostics, command_name, err);
    }

    result
}

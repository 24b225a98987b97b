//! Analysis job commands

use serde::{Deserialize, Serialize};
use shelfsight_domain::{AnalysisJob, LogEvent, Result as DomainResult, ShelfSightError, VideoId};
use tracing::info;

use crate::context::AppContext;
use crate::utils::command_helpers::execute_command;

/// A job together with its accumulated log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSnapshot {
    pub job: AnalysisJob,
    pub logs: Vec<LogEvent>,
}

impl AnalysisSnapshot {
    fn capture(ctx: &AppContext, video_id: &VideoId) -> Self {
        Self { job: ctx.analysis.snapshot(video_id), logs: ctx.analysis.logs(video_id) }
    }
}

/// # Errors
/// See [`shelfsight_core::AnalysisJobController::start`].
pub async fn start_analysis(ctx: &AppContext, video_id: &VideoId) -> DomainResult<AnalysisJob> {
    execute_command(ctx, "analysis::start_analysis", || async { Ok(ctx.analysis.start(video_id).await?) }).await
}

/// # Errors
/// `Precondition` unless the job is analyzing.
pub async fn stop_analysis(ctx: &AppContext, video_id: &VideoId) -> DomainResult<AnalysisJob> {
    execute_command(ctx, "analysis::stop_analysis", || async { Ok(ctx.analysis.stop(video_id).await?) }).await
}

pub async fn reset_analysis(ctx: &AppContext, video_id: &VideoId) -> DomainResult<AnalysisJob> {
    execute_command(ctx, "analysis::reset_analysis", || async { Ok(ctx.analysis.reset(video_id).await) }).await
}

pub async fn analysis_snapshot(ctx: &AppContext, video_id: &VideoId) -> DomainResult<AnalysisSnapshot> {
    execute_command(ctx, "analysis::analysis_snapshot", || async { Ok(AnalysisSnapshot::capture(ctx, video_id)) })
        .await
}

/// Wait until the job of `video_id` leaves `Starting`/`Analyzing`, logging
/// each new event as the controller publishes it.
///
/// # Errors
/// `Internal` if the controller goes away while waiting.
pub async fn wait_for_analysis(ctx: &AppContext, video_id: &VideoId) -> DomainResult<AnalysisSnapshot> {
    execute_command(ctx, "analysis::wait_for_analysis", || async {
        let mut updates = ctx.analysis.subscribe();
        let mut seen_logs = 0;
        loop {
            let job = ctx.analysis.snapshot(video_id);
            let (fresh, total) = ctx.analysis.logs_since(video_id, seen_logs);
            for event in &fresh {
                info!(video = %video_id, kind = %event.kind, "{}", event.message);
            }
            seen_logs = total;

            if !job.status.is_active() {
                return Ok(AnalysisSnapshot::capture(ctx, video_id));
            }
            updates
                .changed()
                .await
                .map_err(|_| ShelfSightError::Internal("analysis controller shut down".into()))?;
        }
    })
    .await
}

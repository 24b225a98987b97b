//! Video listing and upload commands

use std::path::Path;

use shelfsight_core::{ProgressCallback, ValidationReport};
use shelfsight_domain::{Result as DomainResult, UploadReceipt, VideoInfo};

use crate::context::AppContext;
use crate::utils::command_helpers::execute_command;

pub async fn list_videos(ctx: &AppContext) -> DomainResult<Vec<VideoInfo>> {
    execute_command(ctx, "videos::list_videos", || ctx.videos.list()).await
}

/// Check a local file against the upload limits without sending it.
pub async fn validate_video(ctx: &AppContext, path: &Path) -> DomainResult<ValidationReport> {
    execute_command(ctx, "videos::validate_video", || ctx.videos.check(path)).await
}

/// # Errors
/// `Validation` when the file is rejected locally, transport errors
/// otherwise.
pub async fn upload_video(ctx: &AppContext, path: &Path, progress: ProgressCallback) -> DomainResult<UploadReceipt> {
    execute_command(ctx, "videos::upload_video", || ctx.videos.upload(path, progress)).await
}

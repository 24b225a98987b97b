//! ROI persistence commands

use shelfsight_domain::{PolygonRoi, Result as DomainResult, RoiId, RoiMap, VideoId};

use crate::context::AppContext;
use crate::utils::command_helpers::execute_command;

/// Reload every saved polygon from the backend. Never fails: an unreachable
/// backend yields an empty mapping.
pub async fn list_rois(ctx: &AppContext) -> DomainResult<RoiMap> {
    execute_command(ctx, "rois::list_rois", || async { Ok(ctx.rois.refresh().await) }).await
}

pub async fn staged_rois(ctx: &AppContext, video_id: &VideoId) -> DomainResult<Vec<PolygonRoi>> {
    execute_command(ctx, "rois::staged_rois", || async { Ok(ctx.rois.staged(video_id)) }).await
}

/// Drop one staged polygon; `false` when it was not staged.
pub async fn remove_staged_roi(ctx: &AppContext, video_id: &VideoId, id: RoiId) -> DomainResult<bool> {
    execute_command(ctx, "rois::remove_staged_roi", || async { Ok(ctx.rois.remove(video_id, id)) }).await
}

/// Saved polygons of `video_id` as committed polygons with fresh ids, as of
/// the last refresh.
pub fn saved_polygons(ctx: &AppContext, video_id: &VideoId) -> Vec<PolygonRoi> {
    ctx.rois
        .list_for(video_id)
        .into_iter()
        .map(|stored| PolygonRoi {
            id: ctx.roi_ids.next_id(),
            points: stored.vertices(),
            name: stored.name,
            category: None,
        })
        .collect()
}

/// Refresh, then stage the saved polygons of `video_id` so the next persist
/// keeps them. Returns how many were staged.
pub async fn stage_saved_rois(ctx: &AppContext, video_id: &VideoId) -> DomainResult<usize> {
    execute_command(ctx, "rois::stage_saved_rois", || async {
        ctx.rois.refresh().await;
        let saved = saved_polygons(ctx, video_id);
        let count = saved.len();
        for polygon in saved {
            ctx.rois.stage(video_id, polygon);
        }
        Ok(count)
    })
    .await
}

/// Send the staged polygons of `video_id` to the backend in one request.
///
/// # Errors
/// Nothing staged, a polygon with fewer than three vertices, or a failed
/// request.
pub async fn persist_rois(ctx: &AppContext, video_id: &VideoId) -> DomainResult<usize> {
    execute_command(ctx, "rois::persist_rois", || async { Ok(ctx.rois.persist(video_id).await?) }).await
}

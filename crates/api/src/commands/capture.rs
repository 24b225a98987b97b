//! Polygon capture and rendering commands

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use shelfsight_core::RenderTarget;
use shelfsight_domain::{
    FrameSize, Point, PolygonRoi, ReferenceFrame, Result as DomainResult, ShelfSightError, VideoId,
};
use shelfsight_infra::RasterCanvas;
use tokio::task;
use tracing::{info, warn};

use crate::commands::rois::saved_polygons;
use crate::context::AppContext;
use crate::utils::command_helpers::execute_command;

/// A polygon described up front instead of clicked on a surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolygonDraft {
    pub name: String,
    /// Frame pixel coordinates, in drawing order.
    pub points: Vec<Point>,
}

/// Result of [`render_rois`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderSummary {
    pub output: PathBuf,
    pub surface: FrameSize,
    pub polygons: usize,
    pub draw_ops: usize,
}

/// Drive a capture session through `draft` and stage the committed polygon.
///
/// Points outside the frame are dropped the same way an off-frame click is.
///
/// # Errors
/// `Precondition` when the frame is not ready, `Validation` when fewer than
/// three points survive or the name is blank.
pub async fn capture_polygon(
    ctx: &AppContext,
    video_id: &VideoId,
    frame: ReferenceFrame,
    draft: &PolygonDraft,
) -> DomainResult<PolygonRoi> {
    execute_command(ctx, "capture::capture_polygon", || async {
        let mut session = ctx.capture_session(video_id.clone());
        session.enter(&frame)?;

        let mut dropped = 0_usize;
        for point in &draft.points {
            if !session.add_point(*point)? {
                dropped += 1;
            }
        }
        if dropped > 0 {
            warn!(video = %video_id, dropped, "points outside the frame were ignored");
        }

        session.request_close()?;
        let roi = session.commit(&draft.name)?;
        info!(video = %video_id, roi = %roi.id, vertices = roi.points.len(), "polygon staged");
        Ok(roi)
    })
    .await
}

/// Decode the image at `frame_path` and describe it as a ready reference
/// frame of its intrinsic size.
///
/// # Errors
/// `NotFound` for a missing file, `Render` for an undecodable or empty one.
pub async fn reference_frame(ctx: &AppContext, frame_path: &Path) -> DomainResult<ReferenceFrame> {
    execute_command(ctx, "capture::reference_frame", || async {
        let (_, surface) = open_canvas(frame_path.to_path_buf()).await?;
        Ok(ReferenceFrame::ready(surface.width, surface.height))
    })
    .await
}

/// Paint the saved and staged polygons of `video_id` over the frame image at
/// `frame_path` and write the result to `output`.
///
/// # Errors
/// `NotFound` or `Render` for unreadable images, `Render` for encoding
/// failures.
pub async fn render_rois(
    ctx: &AppContext,
    frame_path: &Path,
    video_id: &VideoId,
    output: &Path,
) -> DomainResult<RenderSummary> {
    execute_command(ctx, "capture::render_rois", || async {
        let (mut canvas, surface) = open_canvas(frame_path.to_path_buf()).await?;

        ctx.rois.refresh().await;
        let mut polygons = saved_polygons(ctx, video_id);
        polygons.extend(ctx.rois.staged(video_id));

        let frame = ReferenceFrame::ready(surface.width, surface.height);
        let scene = ctx.renderer.render(&frame, surface, &polygons, &[]);
        let draw_ops = scene.ops.len();

        let target = output.to_path_buf();
        task::spawn_blocking(move || -> DomainResult<()> {
            canvas.present(&scene)?;
            canvas.save(&target)
        })
        .await
        .map_err(|e| ShelfSightError::Internal(format!("Task join error: {e}")))??;

        info!(video = %video_id, polygons = polygons.len(), output = %output.display(), "ROIs rendered");
        Ok(RenderSummary { output: output.to_path_buf(), surface, polygons: polygons.len(), draw_ops })
    })
    .await
}

/// Decode a frame image on the blocking pool.
async fn open_canvas(frame_path: PathBuf) -> DomainResult<(RasterCanvas, FrameSize)> {
    task::spawn_blocking(move || -> DomainResult<(RasterCanvas, FrameSize)> {
        let canvas = RasterCanvas::open(&frame_path)?;
        let surface = canvas
            .frame_size()
            .filter(|size| !size.is_empty())
            .ok_or_else(|| ShelfSightError::Render(format!("{} has no pixels", frame_path.display())))?;
        Ok((canvas, surface))
    })
    .await
    .map_err(|e| ShelfSightError::Internal(format!("Task join error: {e}")))?
}

//! Remote ROI storage port

use async_trait::async_trait;
use shelfsight_domain::{PersistReceipt, PolygonRoi, Result, RoiMap, VideoId};

/// Backend that stores the polygon list of each video.
#[async_trait]
pub trait RoiGateway: Send + Sync {
    /// Every saved polygon keyed by video.
    async fn fetch_rois(&self) -> Result<RoiMap>;

    /// Replace the saved polygons of `video_id` with `rois` in one request.
    async fn save_rois(&self, video_id: &VideoId, rois: &[PolygonRoi]) -> Result<PersistReceipt>;
}

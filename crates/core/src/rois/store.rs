use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use shelfsight_domain::constants::MIN_POLYGON_POINTS;
use shelfsight_domain::{PolygonRoi, RoiId, RoiMap, StoredRoi, VideoId};
use tracing::{info, instrument, warn};

use super::error::RoiError;
use super::ports::RoiGateway;
use crate::analysis::ports::RoiDirectory;
use crate::capture::PolygonSink;

/// Local staging plus the last known saved mapping.
///
/// Locks are never held across an await; every read is a snapshot.
pub struct RoiStore {
    gateway: Arc<dyn RoiGateway>,
    staged: RwLock<HashMap<VideoId, Vec<PolygonRoi>>>,
    saved: RwLock<RoiMap>,
}

impl std::fmt::Debug for RoiStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoiStore")
            .field("staged_videos", &self.staged.read().len())
            .field("saved_videos", &self.saved.read().len())
            .finish_non_exhaustive()
    }
}

impl RoiStore {
    pub fn new(gateway: Arc<dyn RoiGateway>) -> Self {
        Self { gateway, staged: RwLock::new(HashMap::new()), saved: RwLock::new(RoiMap::new()) }
    }

    /// Append to the staging list of `video_id`.
    pub fn stage(&self, video_id: &VideoId, polygon: PolygonRoi) {
        let mut staged = self.staged.write();
        let list = staged.entry(video_id.clone()).or_default();
        list.push(polygon);
        info!(video = %video_id, staged = list.len(), "polygon staged");
    }

    /// Remove a staged polygon by id. Returns whether anything was removed.
    pub fn remove(&self, video_id: &VideoId, id: RoiId) -> bool {
        let mut staged = self.staged.write();
        let Some(list) = staged.get_mut(video_id) else {
            return false;
        };
        let before = list.len();
        list.retain(|polygon| polygon.id != id);
        before != list.len()
    }

    pub fn staged(&self, video_id: &VideoId) -> Vec<PolygonRoi> {
        self.staged.read().get(video_id).cloned().unwrap_or_default()
    }

    /// Send every staged polygon of `video_id` in one request.
    ///
    /// Staging is kept on both success and failure.
    ///
    /// # Errors
    /// [`RoiError::PersistFailure`] when nothing is staged, when a staged
    /// polygon has fewer than three vertices, or when the request fails.
    #[instrument(skip(self), fields(video = %video_id))]
    pub async fn persist(&self, video_id: &VideoId) -> Result<usize, RoiError> {
        let polygons = self.staged(video_id);
        if polygons.is_empty() {
            return Err(RoiError::PersistFailure { reason: "no polygons staged for this video".into() });
        }
        if let Some(bad) = polygons.iter().find(|p| p.points.len() < MIN_POLYGON_POINTS) {
            return Err(RoiError::PersistFailure {
                reason: format!("polygon '{}' has fewer than {MIN_POLYGON_POINTS} points", bad.name),
            });
        }

        match self.gateway.save_rois(video_id, &polygons).await {
            Ok(receipt) => {
                let stored = polygons.iter().map(StoredRoi::from).collect();
                self.saved.write().insert(video_id.clone(), stored);
                info!(rois_count = receipt.rois_count, "ROIs persisted");
                Ok(receipt.rois_count)
            }
            Err(err) => {
                warn!(error = %err, "ROI persist failed");
                Err(RoiError::PersistFailure { reason: err.to_string() })
            }
        }
    }

    /// Reload the saved mapping. A failed fetch yields an empty mapping.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> RoiMap {
        let map = match self.gateway.fetch_rois().await {
            Ok(map) => map,
            Err(err) => {
                warn!(error = %err, "ROI listing unavailable, treating as empty");
                RoiMap::new()
            }
        };
        *self.saved.write() = map.clone();
        map
    }

    /// Saved polygons for `video_id`.
    pub fn list_for(&self, video_id: &VideoId) -> Vec<StoredRoi> {
        self.saved.read().get(video_id).cloned().unwrap_or_default()
    }

    pub fn all(&self) -> RoiMap {
        self.saved.read().clone()
    }
}

impl PolygonSink for RoiStore {
    fn accept(&self, video_id: &VideoId, polygon: PolygonRoi) {
        self.stage(video_id, polygon);
    }
}

impl RoiDirectory for RoiStore {
    fn roi_count(&self, video_id: &VideoId) -> usize {
        self.saved.read().get(video_id).map_or(0, Vec::len)
    }
}

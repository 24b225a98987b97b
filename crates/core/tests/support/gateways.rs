//! Mock implementations of the core ports

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use shelfsight_core::{AnalysisGateway, ProgressCallback, RoiDirectory, RoiGateway, VideoCatalog};
use shelfsight_domain::{
    AnalysisStartResponse, AnalysisStatusReport, PersistReceipt, PolygonRoi, RemoteJobState,
    Result as DomainResult, RoiMap, ShelfSightError, UploadProgress, UploadReceipt, VideoId,
    VideoInfo,
};

/// Decode a status payload exactly as the backend would send it.
pub fn report(value: Value) -> AnalysisStatusReport {
    serde_json::from_value(value).unwrap()
}

pub fn start_response(value: Value) -> AnalysisStartResponse {
    serde_json::from_value(value).unwrap()
}

/// Analysis backend answering from a script.
///
/// Status calls pop the next scripted result; once the script is empty every
/// call answers a bare `{"status": "analyzing"}`.
pub struct ScriptedAnalysisGateway {
    start: Mutex<Option<DomainResult<AnalysisStartResponse>>>,
    statuses: Mutex<VecDeque<DomainResult<AnalysisStatusReport>>>,
    status_delay: Mutex<Duration>,
    reset_result: Mutex<DomainResult<()>>,
    pub start_calls: AtomicUsize,
    pub status_calls: AtomicUsize,
    pub reset_calls: AtomicUsize,
}

impl ScriptedAnalysisGateway {
    pub fn new(start: AnalysisStartResponse) -> Self {
        Self {
            start: Mutex::new(Some(Ok(start))),
            statuses: Mutex::new(VecDeque::new()),
            status_delay: Mutex::new(Duration::ZERO),
            reset_result: Mutex::new(Ok(())),
            start_calls: AtomicUsize::new(0),
            status_calls: AtomicUsize::new(0),
            reset_calls: AtomicUsize::new(0),
        }
    }

    pub fn failing_start(error: ShelfSightError) -> Self {
        let gateway = Self::new(AnalysisStartResponse::default());
        *gateway.start.lock() = Some(Err(error));
        gateway
    }

    pub fn push_status(&self, report: AnalysisStatusReport) {
        self.statuses.lock().push_back(Ok(report));
    }

    pub fn push_status_error(&self, error: ShelfSightError) {
        self.statuses.lock().push_back(Err(error));
    }

    /// Every status call sleeps this long before answering.
    pub fn delay_statuses(&self, delay: Duration) {
        *self.status_delay.lock() = delay;
    }

    pub fn fail_reset(&self, error: ShelfSightError) {
        *self.reset_result.lock() = Err(error);
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn start_calls(&self) -> usize {
        self.start_calls.load(Ordering::SeqCst)
    }

    pub fn reset_calls(&self) -> usize {
        self.reset_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AnalysisGateway for ScriptedAnalysisGateway {
    async fn start_analysis(&self, _video_id: &VideoId) -> DomainResult<AnalysisStartResponse> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        self.start.lock().clone().unwrap_or_else(|| Ok(AnalysisStartResponse::default()))
    }

    async fn analysis_status(&self, _video_id: &VideoId) -> DomainResult<AnalysisStatusReport> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.status_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let next = self.statuses.lock().pop_front();
        next.unwrap_or_else(|| {
            Ok(AnalysisStatusReport { status: RemoteJobState::Analyzing, ..AnalysisStatusReport::default() })
        })
    }

    async fn reset_analysis(&self, _video_id: &VideoId) -> DomainResult<()> {
        self.reset_calls.fetch_add(1, Ordering::SeqCst);
        self.reset_result.lock().clone()
    }
}

/// Fixed ROI counts per video.
#[derive(Default)]
pub struct StaticRoiDirectory {
    counts: HashMap<VideoId, usize>,
}

impl StaticRoiDirectory {
    pub fn with(mut self, video: &str, count: usize) -> Self {
        self.counts.insert(VideoId::new(video), count);
        self
    }
}

impl RoiDirectory for StaticRoiDirectory {
    fn roi_count(&self, video_id: &VideoId) -> usize {
        self.counts.get(video_id).copied().unwrap_or(0)
    }
}

/// ROI backend that records what was saved.
#[derive(Default)]
pub struct RecordingRoiGateway {
    listing: Mutex<Option<DomainResult<RoiMap>>>,
    save_error: Mutex<Option<ShelfSightError>>,
    pub saved: Mutex<Vec<(VideoId, Vec<PolygonRoi>)>>,
}

impl RecordingRoiGateway {
    pub fn with_listing(self, listing: DomainResult<RoiMap>) -> Self {
        *self.listing.lock() = Some(listing);
        self
    }

    pub fn fail_saves(&self, error: ShelfSightError) {
        *self.save_error.lock() = Some(error);
    }

    pub fn allow_saves(&self) {
        *self.save_error.lock() = None;
    }
}

#[async_trait]
impl RoiGateway for RecordingRoiGateway {
    async fn fetch_rois(&self) -> DomainResult<RoiMap> {
        self.listing.lock().clone().unwrap_or_else(|| Ok(RoiMap::new()))
    }

    async fn save_rois(&self, video_id: &VideoId, rois: &[PolygonRoi]) -> DomainResult<PersistReceipt> {
        if let Some(error) = self.save_error.lock().clone() {
            return Err(error);
        }
        self.saved.lock().push((video_id.clone(), rois.to_vec()));
        Ok(PersistReceipt { video_id: video_id.clone(), rois_count: rois.len() })
    }
}

/// Video backend that "uploads" by reporting progress in fixed chunks.
#[derive(Default)]
pub struct FakeVideoCatalog {
    pub videos: Vec<VideoInfo>,
    pub uploads: AtomicUsize,
}

#[async_trait]
impl VideoCatalog for FakeVideoCatalog {
    async fn list_videos(&self) -> DomainResult<Vec<VideoInfo>> {
        Ok(self.videos.clone())
    }

    async fn upload_video(&self, path: &Path, progress: ProgressCallback) -> DomainResult<UploadReceipt> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        let total = tokio::fs::metadata(path).await.map(|m| m.len()).unwrap_or(0);
        let mut sent = 0;
        while sent < total {
            sent = (sent + 1024).min(total);
            progress(UploadProgress::new(sent, total));
        }
        Ok(UploadReceipt {
            filename: path.file_name().unwrap().to_string_lossy().into_owned(),
            path: None,
            message: Some("Video uploaded successfully".into()),
            size: Some(total),
            processing_time: Some(0.01),
        })
    }
}

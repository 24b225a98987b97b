//! Port interfaces used by the analysis controller

use async_trait::async_trait;
use shelfsight_domain::{AnalysisStartResponse, AnalysisStatusReport, Result, VideoId};

/// Remote side of an analysis job.
#[async_trait]
pub trait AnalysisGateway: Send + Sync {
    async fn start_analysis(&self, video_id: &VideoId) -> Result<AnalysisStartResponse>;

    async fn analysis_status(&self, video_id: &VideoId) -> Result<AnalysisStatusReport>;

    /// Ask the backend to discard its session state for `video_id`.
    async fn reset_analysis(&self, video_id: &VideoId) -> Result<()>;
}

/// Synchronous snapshot of how many saved ROIs a video has.
pub trait RoiDirectory: Send + Sync {
    fn roi_count(&self, video_id: &VideoId) -> usize;
}

//! Video backend port

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use shelfsight_domain::{Result, UploadProgress, UploadReceipt, VideoInfo};

/// Called as upload bytes leave the client.
pub type ProgressCallback = Arc<dyn Fn(UploadProgress) + Send + Sync>;

#[async_trait]
pub trait VideoCatalog: Send + Sync {
    async fn list_videos(&self) -> Result<Vec<VideoInfo>>;

    async fn upload_video(&self, path: &Path, progress: ProgressCallback) -> Result<UploadReceipt>;
}

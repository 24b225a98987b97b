use std::path::Path;
use std::sync::Arc;

use shelfsight_domain::{Result, ShelfSightError, UploadReceipt, VideoInfo};
use tracing::{info, instrument, warn};

use super::ports::{ProgressCallback, VideoCatalog};
use super::validation::{UploadValidator, ValidationReport, VideoCandidate};

/// Listing and validated upload of videos.
pub struct VideoService {
    catalog: Arc<dyn VideoCatalog>,
    validator: UploadValidator,
}

impl VideoService {
    pub fn new(catalog: Arc<dyn VideoCatalog>, validator: UploadValidator) -> Self {
        Self { catalog, validator }
    }

    pub fn validator(&self) -> &UploadValidator {
        &self.validator
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<VideoInfo>> {
        let videos = self.catalog.list_videos().await?;
        info!(count = videos.len(), "videos listed");
        Ok(videos)
    }

    /// Validate the file at `path` without uploading it.
    ///
    /// # Errors
    /// [`ShelfSightError::NotFound`] if the file cannot be inspected.
    pub async fn check(&self, path: &Path) -> Result<ValidationReport> {
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| ShelfSightError::NotFound(format!("{}: {e}", path.display())))?;
        Ok(self.validator.validate(&VideoCandidate::from_path(path, metadata.len())))
    }

    /// Validate, then stream the file to the backend.
    ///
    /// # Errors
    /// [`ShelfSightError::Validation`] before any transfer when the file is
    /// rejected; transport errors from the catalog otherwise.
    #[instrument(skip(self, progress), fields(path = %path.display()))]
    pub async fn upload(&self, path: &Path, progress: ProgressCallback) -> Result<UploadReceipt> {
        let report = self.check(path).await?;
        for warning in &report.warnings {
            warn!(%warning, "upload warning");
        }
        report.ensure_valid()?;

        let receipt = self.catalog.upload_video(path, progress).await?;
        info!(filename = %receipt.filename, "video uploaded");
        Ok(receipt)
    }
}

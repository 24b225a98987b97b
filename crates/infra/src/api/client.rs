//! HTTP adapter for the analysis backend
//!
//! One [`BackendClient`] serves the ROI, analysis and video ports. Every call
//! is bounded by a per-class deadline and every non-success status is mapped
//! through [`map_status_error`].

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use shelfsight_common::{ErrorClassification, ErrorSeverity};
use shelfsight_core::video::VideoCandidate;
use shelfsight_core::{AnalysisGateway, ProgressCallback, RoiGateway, VideoCatalog};
use shelfsight_domain::constants::UPLOAD_FIELD_NAME;
use shelfsight_domain::{
    AnalysisStartResponse, AnalysisStatusReport, ApiConfig, PersistReceipt, PolygonRoi, Result,
    RoiMap, ShelfSightError, UploadProgress, UploadReceipt, VideoId, VideoInfo, VideoListing,
};
use tokio_util::io::ReaderStream;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use super::errors::{map_status_error, ApiError};
use crate::http::HttpClient;

/// Whether a request may be replayed by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delivery {
    Retried,
    Once,
}

/* -------------------------------------------------------------------------- */
/* Wire shapes */
/* -------------------------------------------------------------------------- */

#[derive(Debug, Serialize)]
struct WirePoint {
    x: i32,
    y: i32,
}

#[derive(Debug, Serialize)]
struct WireRoi {
    id: u64,
    name: String,
    points: Vec<WirePoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<String>,
}

#[derive(Debug, Serialize)]
struct SaveRoisRequest<'a> {
    video_filename: &'a str,
    rois: Vec<WireRoi>,
}

#[derive(Debug, Serialize)]
struct AnalyzeRequest<'a> {
    video_filename: &'a str,
}

impl From<&PolygonRoi> for WireRoi {
    fn from(roi: &PolygonRoi) -> Self {
        Self {
            id: roi.id.0,
            name: roi.display_name(),
            points: roi.points.iter().map(|p| WirePoint { x: p.x, y: p.y }).collect(),
            category: roi.category.clone(),
        }
    }
}

/* -------------------------------------------------------------------------- */
/* Client */
/* -------------------------------------------------------------------------- */

/// Backend client built from [`ApiConfig`].
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: HttpClient,
    base_url: Url,
    metadata_timeout: Duration,
    mutation_timeout: Duration,
    upload_timeout: Duration,
}

impl BackendClient {
    /// # Errors
    /// `Config` when the base URL cannot be parsed or cannot carry a path.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let base_url = Url::parse(config.base_url.trim())
            .map_err(|err| ShelfSightError::Config(format!("invalid API base URL '{}': {err}", config.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(ShelfSightError::Config(format!("API base URL '{base_url}' cannot carry a path")));
        }

        let http = HttpClient::builder()
            .without_timeout()
            .max_attempts(config.max_attempts)
            .base_backoff(config.base_backoff())
            .user_agent(concat!("shelfsight/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url,
            metadata_timeout: config.metadata_timeout(),
            mutation_timeout: config.mutation_timeout(),
            upload_timeout: config.upload_timeout(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> std::result::Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::Config(format!("API base URL '{}' cannot carry a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> std::result::Result<T, ApiError> {
        let url = self.endpoint(segments)?;
        let request = self.http.request(Method::GET, url.clone());
        self.dispatch(request, &url, self.metadata_timeout, Delivery::Retried).await
    }

    async fn post_json<B, T>(&self, segments: &[&str], body: Option<&B>) -> std::result::Result<T, ApiError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let url = self.endpoint(segments)?;
        let mut request = self.http.request(Method::POST, url.clone());
        if let Some(body) = body {
            request = request.json(body);
        }
        self.dispatch(request, &url, self.mutation_timeout, Delivery::Once).await
    }

    /// Send, check the status, then decode the body, all within `deadline`.
    async fn dispatch<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        url: &Url,
        deadline: Duration,
        delivery: Delivery,
    ) -> std::result::Result<T, ApiError> {
        let exchange = async {
            let response = match delivery {
                Delivery::Retried => self.http.send(request).await,
                Delivery::Once => self.http.send_once(request).await,
            }
            .map_err(transport_error)?;

            let status = response.status();
            let body = response.text().await.map_err(|err| ApiError::Network(err.to_string()))?;

            if !status.is_success() {
                return Err(map_status_error(status, url.as_str(), &body));
            }

            serde_json::from_str::<T>(&body)
                .map_err(|err| ApiError::Decode { url: url.to_string(), message: err.to_string() })
        };

        match tokio::time::timeout(deadline, exchange).await {
            Ok(result) => result,
            Err(_) => Err(ApiError::Timeout(deadline)),
        }
    }
}

fn transport_error(err: ShelfSightError) -> ApiError {
    match err {
        ShelfSightError::Config(message) => ApiError::Config(message),
        other => ApiError::Network(other.to_string()),
    }
}

/// Log a failed call at the level its severity asks for, then convert it.
fn logged<T>(operation: &'static str, result: std::result::Result<T, ApiError>) -> Result<T> {
    result.map_err(|err| {
        let category = err.category();
        let retryable = err.is_retryable();
        match err.severity() {
            ErrorSeverity::Info => {
                debug!(operation, ?category, retryable, error = %err, "backend call failed");
            }
            ErrorSeverity::Warning => {
                warn!(operation, ?category, retryable, error = %err, "backend call failed");
            }
            severity @ (ErrorSeverity::Error | ErrorSeverity::Critical) => {
                error!(operation, ?category, retryable, %severity, error = %err, "backend call failed");
            }
        }
        ShelfSightError::from(err)
    })
}

/* -------------------------------------------------------------------------- */
/* Ports */
/* -------------------------------------------------------------------------- */

#[async_trait]
impl RoiGateway for BackendClient {
    #[instrument(skip(self))]
    async fn fetch_rois(&self) -> Result<RoiMap> {
        let rois: RoiMap = logged("fetch_rois", self.get_json(&["get-rois"]).await)?;
        debug!(videos = rois.len(), "fetched saved ROIs");
        Ok(rois)
    }

    #[instrument(skip(self, rois), fields(video = %video_id, count = rois.len()))]
    async fn save_rois(&self, video_id: &VideoId, rois: &[PolygonRoi]) -> Result<PersistReceipt> {
        let body = SaveRoisRequest {
            video_filename: video_id.as_str(),
            rois: rois.iter().map(WireRoi::from).collect(),
        };
        let receipt: PersistReceipt = logged("save_rois", self.post_json(&["rois"], Some(&body)).await)?;
        info!(saved = receipt.rois_count, "ROIs persisted");
        Ok(receipt)
    }
}

#[async_trait]
impl AnalysisGateway for BackendClient {
    #[instrument(skip(self), fields(video = %video_id))]
    async fn start_analysis(&self, video_id: &VideoId) -> Result<AnalysisStartResponse> {
        let body = AnalyzeRequest { video_filename: video_id.as_str() };
        logged("start_analysis", self.post_json(&["analyze-behavior"], Some(&body)).await)
    }

    #[instrument(skip(self), fields(video = %video_id))]
    async fn analysis_status(&self, video_id: &VideoId) -> Result<AnalysisStatusReport> {
        logged("analysis_status", self.get_json(&["analysis-status", video_id.as_str()]).await)
    }

    #[instrument(skip(self), fields(video = %video_id))]
    async fn reset_analysis(&self, video_id: &VideoId) -> Result<()> {
        let _: serde_json::Value = logged(
            "reset_analysis",
            self.post_json::<(), _>(&["reset-analysis", video_id.as_str()], None).await,
        )?;
        Ok(())
    }
}

#[async_trait]
impl VideoCatalog for BackendClient {
    #[instrument(skip(self))]
    async fn list_videos(&self) -> Result<Vec<VideoInfo>> {
        let listing: VideoListing = logged("list_videos", self.get_json(&["get-videos"]).await)?;
        Ok(listing.videos)
    }

    #[instrument(skip(self, progress), fields(path = %path.display()))]
    async fn upload_video(&self, path: &Path, progress: ProgressCallback) -> Result<UploadReceipt> {
        let file = tokio::fs::File::open(path).await.map_err(crate::errors::InfraError::from)?;
        let total = file.metadata().await.map_err(crate::errors::InfraError::from)?.len();
        let candidate = VideoCandidate::from_path(path, total);

        let sent = Arc::new(AtomicU64::new(0));
        let stream = ReaderStream::new(file).inspect(move |chunk| {
            if let Ok(bytes) = chunk {
                let so_far = sent.fetch_add(bytes.len() as u64, Ordering::Relaxed) + bytes.len() as u64;
                progress(UploadProgress::new(so_far, total));
            }
        });

        let mut part = Part::stream_with_length(Body::wrap_stream(stream), total).file_name(candidate.name.clone());
        if let Some(mime) = candidate.mime_type.as_deref() {
            part = part.mime_str(mime).map_err(crate::errors::InfraError::from)?;
        }
        let form = Form::new().part(UPLOAD_FIELD_NAME, part);

        let url = logged("upload_video", self.endpoint(&["upload-video"]))?;
        let request = self.http.request(Method::POST, url.clone()).multipart(form);
        let receipt: UploadReceipt =
            logged("upload_video", self.dispatch(request, &url, self.upload_timeout, Delivery::Once).await)?;

        info!(filename = %receipt.filename, bytes = total, "video uploaded");
        Ok(receipt)
    }
}

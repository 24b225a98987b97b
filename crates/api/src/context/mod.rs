//! Application context - dependency injection container

use std::sync::Arc;

use shelfsight_common::DiagnosticsLog;
use shelfsight_core::{
    AnalysisControllerConfig, AnalysisGateway, AnalysisJobController, CanvasRenderer, GeometryCapture,
    RenderStyle, RoiGateway, RoiIdMinter, RoiStore, UploadValidator, VideoCatalog, VideoService,
};
use shelfsight_domain::{Config, Result, VideoId};
use shelfsight_infra::BackendClient;
use tracing::info;

/// The remote side of every core port.
#[derive(Clone)]
pub struct BackendPorts {
    pub rois: Arc<dyn RoiGateway>,
    pub analysis: Arc<dyn AnalysisGateway>,
    pub videos: Arc<dyn VideoCatalog>,
}

impl BackendPorts {
    /// All three ports served by one HTTP client.
    pub fn from_client(client: Arc<BackendClient>) -> Self {
        Self { rois: client.clone(), analysis: client.clone(), videos: client }
    }
}

/// Application context - holds all services and dependencies
pub struct AppContext {
    pub config: Config,
    pub diagnostics: DiagnosticsLog,
    pub rois: Arc<RoiStore>,
    pub roi_ids: Arc<RoiIdMinter>,
    pub analysis: Arc<AnalysisJobController>,
    pub videos: Arc<VideoService>,
    pub renderer: CanvasRenderer,
}

impl AppContext {
    /// Create a new application context with default configuration
    ///
    /// # Errors
    /// `Config` when the default backend URL cannot be used.
    pub fn new() -> Result<Self> {
        Self::new_with_config(Config::default())
    }

    /// Create a context talking HTTP to `config.api.base_url`.
    ///
    /// # Errors
    /// `Config` when the backend URL is invalid.
    pub fn new_with_config(config: Config) -> Result<Self> {
        let client = Arc::new(BackendClient::new(&config.api)?);
        info!(backend = %client.base_url(), "backend client ready");
        Ok(Self::with_ports(config, BackendPorts::from_client(client)))
    }

    /// Wire every service around the given ports.
    pub fn with_ports(config: Config, ports: BackendPorts) -> Self {
        let diagnostics = DiagnosticsLog::new(config.diagnostics.capacity);
        let rois = Arc::new(RoiStore::new(ports.rois));
        let analysis = Arc::new(AnalysisJobController::new(
            ports.analysis,
            rois.clone(),
            AnalysisControllerConfig::from(&config.analysis),
        ));
        let validator = UploadValidator::new(config.upload.clone()).with_diagnostics(diagnostics.clone());
        let videos = Arc::new(VideoService::new(ports.videos, validator));

        Self {
            config,
            diagnostics,
            rois,
            roi_ids: Arc::new(RoiIdMinter::new()),
            analysis,
            videos,
            renderer: CanvasRenderer::new(RenderStyle::default()),
        }
    }

    /// Fresh capture session whose committed polygons are staged in
    /// [`Self::rois`].
    pub fn capture_session(&self, video_id: VideoId) -> GeometryCapture {
        GeometryCapture::new(video_id, self.roi_ids.clone()).with_sink(self.rois.clone())
    }

    /// Stop every poll task and wait for it to finish.
    pub async fn shutdown(&self) {
        info!(active_jobs = self.analysis.active_jobs().len(), "shutdown called on AppContext");
        self.analysis.shutdown().await;
    }
}

//! # ShelfSight Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Polygon capture state machine and display→frame coordinate mapping
//! - Scene building for the capture surface
//! - ROI staging and persistence orchestration
//! - Analysis job orchestration (start, poll, merge, timeout, stop, reset)
//! - Upload validation
//! - Port/adapter interfaces (traits) for everything remote
//!
//! ## Architecture Principles
//! - Only depends on `shelfsight-domain` and `shelfsight-common`
//! - No HTTP or image code; all external I/O goes through traits
//! - Pure, testable business logic

pub mod analysis;
pub mod capture;
pub mod render;
pub mod rois;
pub mod video;

// Re-export specific items to avoid ambiguity
pub use analysis::ports::{AnalysisGateway, RoiDirectory};
pub use analysis::{AnalysisControllerConfig, AnalysisError, AnalysisJobController, LogAggregator};
pub use capture::{
    CaptureError, CaptureState, CloseTrigger, DisplayRect, GeometryCapture, PolygonSink,
    RoiIdMinter, ViewportTransform,
};
pub use render::{CanvasRenderer, Color, DrawOp, RenderStyle, RenderTarget, Scene};
pub use rois::ports::RoiGateway;
pub use rois::{RoiError, RoiStore};
pub use video::ports::{ProgressCallback, VideoCatalog};
pub use video::{UploadValidator, ValidationReport, VideoCandidate, VideoService};

//! Backend API client for ShelfSight
//!
//! HTTP adapter for the video analysis backend. It implements the ROI, analysis
//! and video ports defined in `shelfsight-core`.
//!
//! # Architecture
//!
//! - Uses [`crate::http::HttpClient`] for transport and retries
//! - Listing calls are bounded by the metadata timeout, mutations by the
//!   mutation timeout, uploads by the upload timeout
//! - Non-success statuses are classified through [`ApiError`]

pub mod client;
pub mod errors;

pub use client::BackendClient;
pub use errors::{map_status_error, ApiError, ApiErrorCategory};

//! # ShelfSight Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - Retrying HTTP client (reqwest)
//! - `BackendClient`: the analysis backend's REST API behind every core port
//! - Configuration loading from environment and files
//! - Raster output of capture-surface scenes (image)
//!
//! ## Architecture
//! - Implements traits defined in `shelfsight-core`
//! - Contains all "impure" code (network, filesystem, pixels)

pub mod api;
pub mod config;
pub mod errors;
pub mod http;
pub mod render;

// Re-export commonly used items
pub use api::{ApiError, ApiErrorCategory, BackendClient};
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder};
pub use render::RasterCanvas;

//! # ShelfSight Domain
//!
//! Business domain types and models for ShelfSight.
//!
//! This crate contains:
//! - Geometry types (Point, PolygonRoi, ReferenceFrame)
//! - Analysis job types (JobStatus, LogEvent, AnalysisStats)
//! - Backend wire shapes shared by core and infra
//! - Domain error types and Result definitions
//! - Configuration structures and constants
//!
//! ## Architecture
//! - No dependencies on other ShelfSight crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;

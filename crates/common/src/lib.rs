//! Common utilities shared across ShelfSight crates.
//!
//! # Modules
//!
//! - `error`: error classification (retryability, severity) implemented by
//!   the adapter error types
//! - `diagnostics`: injectable, bounded in-memory diagnostics log

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod diagnostics;
pub mod error;

// Re-export commonly used types and traits for convenience
// ------------------------
pub use diagnostics::{
    DiagnosticEntry, DiagnosticLevel, DiagnosticsFilter, DiagnosticsLog, DiagnosticsStats,
};
pub use error::{ErrorClassification, ErrorSeverity};

//! # ShelfSight App
//!
//! Application layer - commands and composition root.
//!
//! This crate contains:
//! - Commands (the operations a front end invokes)
//! - Application context (dependency injection)
//! - The `shelfsight` command-line entry point
//!
//! ## Architecture
//! - Depends on `common`, `domain`, `core`, and `infra`
//! - Wires up the hexagonal architecture

pub mod commands;
pub mod context;
pub mod utils;

// Re-export for convenience
pub use commands::*;
pub use context::*;

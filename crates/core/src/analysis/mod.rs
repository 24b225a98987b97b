//! Analysis job orchestration.
//!
//! One remote job per video: start, poll every few seconds, merge streamed
//! log events, detect completion, enforce a hard deadline, stop and reset.

mod controller;
mod error;
mod log;
pub mod ports;

pub use controller::{AnalysisControllerConfig, AnalysisJobController};
pub use error::AnalysisError;
pub use log::LogAggregator;

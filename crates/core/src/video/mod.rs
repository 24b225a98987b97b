//! Video catalogue and upload.

pub mod ports;
mod service;
mod validation;

pub use service::VideoService;
pub use validation::{guess_mime, FileInfo, UploadValidator, ValidationReport, VideoCandidate};

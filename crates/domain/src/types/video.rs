//! Video catalogue and upload types

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Backend video identifier (the stored file name).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VideoId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for VideoId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Borrow<str> for VideoId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Entry returned by `GET /get-videos`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    pub filename: String,
    pub path: String,
    pub url: String,
    pub size: u64,
    /// Seconds since the epoch, as reported by the server filesystem.
    pub created_at: f64,
    pub modified_at: f64,
}

impl VideoInfo {
    pub fn id(&self) -> VideoId {
        VideoId::new(self.filename.clone())
    }
}

/// `GET /get-videos` envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct VideoListing {
    #[serde(default)]
    pub videos: Vec<VideoInfo>,
}

/// Upload transfer progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadProgress {
    pub bytes_sent: u64,
    pub total_bytes: u64,
    pub percent: u8,
}

impl UploadProgress {
    /// `percent = bytes_sent * 100 / total_bytes`, capped at 100.
    pub fn new(bytes_sent: u64, total_bytes: u64) -> Self {
        let percent = if total_bytes == 0 {
            100
        } else {
            let raw = u128::from(bytes_sent) * 100 / u128::from(total_bytes);
            u8::try_from(raw.min(100)).unwrap_or(100)
        };
        Self { bytes_sent, total_bytes, percent }
    }
}

/// Response of `POST /upload-video`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub filename: String,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub processing_time: Option<f64>,
}

/// Outcome of a successful `POST /rois`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistReceipt {
    #[serde(rename = "video")]
    pub video_id: VideoId,
    pub rois_count: usize,
}

//! Domain types and models

pub mod analysis;
pub mod geometry;
pub mod video;

pub use analysis::{
    local_timestamp, AnalysisJob, AnalysisStartResponse, AnalysisStats, AnalysisStatusReport,
    JobStatus, LogEvent, LogEventType, RemoteJobState, RemoteLogEntry, StatsUpdate,
};
pub use geometry::{FrameSize, Point, PolygonRoi, ReferenceFrame, RoiId, RoiMap, StoredRoi};
pub use video::{PersistReceipt, UploadProgress, UploadReceipt, VideoId, VideoInfo, VideoListing};

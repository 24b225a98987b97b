//! Geometry in video pixel space
//!
//! All coordinates here are frame pixels. Display-space pointer positions are
//! mapped into this space before they reach any of these types.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::video::VideoId;
use crate::constants::DEFAULT_ROI_NAME_PREFIX;

/// A vertex in frame pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Inclusive bounds check: `0 <= x <= width` and `0 <= y <= height`.
    pub fn is_within(&self, frame: FrameSize) -> bool {
        let (w, h) = (i64::from(frame.width), i64::from(frame.height));
        let (x, y) = (i64::from(self.x), i64::from(self.y));
        (0..=w).contains(&x) && (0..=h).contains(&y)
    }
}

impl From<[i32; 2]> for Point {
    fn from([x, y]: [i32; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Point> for [i32; 2] {
    fn from(point: Point) -> Self {
        [point.x, point.y]
    }
}

/// Intrinsic pixel dimensions of a frame or surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Availability of the paused video frame that polygons are drawn over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ReferenceFrame {
    pub size: FrameSize,
    /// Whether pixel data can be drawn yet.
    pub decoded: bool,
}

impl ReferenceFrame {
    pub const fn ready(width: u32, height: u32) -> Self {
        Self { size: FrameSize::new(width, height), decoded: true }
    }

    pub const fn pending() -> Self {
        Self { size: FrameSize::new(0, 0), decoded: false }
    }

    /// Loaded with non-zero dimensions.
    pub const fn is_ready(&self) -> bool {
        self.decoded && !self.size.is_empty()
    }
}

/// Identifier minted once when a polygon is committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoiId(pub u64);

impl fmt::Display for RoiId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A committed, named polygon. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolygonRoi {
    pub id: RoiId,
    pub name: String,
    /// Drawing order. The closing edge from last to first is implicit.
    pub points: Vec<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl PolygonRoi {
    /// Name sent to the backend; blank names fall back to `Shelf {id}`.
    pub fn display_name(&self) -> String {
        let trimmed = self.name.trim();
        if trimmed.is_empty() {
            format!("{DEFAULT_ROI_NAME_PREFIX} {}", self.id)
        } else {
            trimmed.to_string()
        }
    }

    /// All edges including the implicit closing edge.
    pub fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        let closing = match (self.points.last(), self.points.first()) {
            (Some(last), Some(first)) if self.points.len() > 1 => Some((*last, *first)),
            _ => None,
        };
        self.points.windows(2).map(|pair| (pair[0], pair[1])).chain(closing)
    }
}

/// Polygon as listed by the backend: `{name, points: [[x, y], ...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRoi {
    pub name: String,
    pub points: Vec<[i32; 2]>,
}

impl StoredRoi {
    pub fn vertices(&self) -> Vec<Point> {
        self.points.iter().copied().map(Point::from).collect()
    }
}

impl From<&PolygonRoi> for StoredRoi {
    fn from(roi: &PolygonRoi) -> Self {
        Self { name: roi.display_name(), points: roi.points.iter().copied().map(Into::into).collect() }
    }
}

/// Durable mapping from video to its saved polygons.
pub type RoiMap = BTreeMap<VideoId, Vec<StoredRoi>>;

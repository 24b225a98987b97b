//! Capture state machine
//!
//! ```text
//! Inactive --enter--> Capturing --request_close / double_activate--> AwaitingName
//!    ^                  |  ^                                             |
//!    +------exit--------+  +----------commit / cancel--------------------+
//! ```
//!
//! `exit` is accepted from every state and discards the open sequence.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use shelfsight_domain::constants::MIN_POLYGON_POINTS;
use shelfsight_domain::{FrameSize, Point, PolygonRoi, ReferenceFrame, VideoId};
use tracing::{debug, info};

use super::error::CaptureError;
use super::id::RoiIdMinter;
use super::transform::ViewportTransform;

/// Receives every committed polygon.
pub trait PolygonSink: Send + Sync {
    fn accept(&self, video_id: &VideoId, polygon: PolygonRoi);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CaptureState {
    #[default]
    Inactive,
    Capturing,
    /// Open sequence closed, waiting for `commit` or `cancel`.
    AwaitingName,
}

/// Which gesture asked to close the open sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseTrigger {
    CloseAction,
    DoubleActivate,
}

/// Per-video capture session over one reference frame.
pub struct GeometryCapture {
    video_id: VideoId,
    state: CaptureState,
    frame: FrameSize,
    points: Vec<Point>,
    minter: Arc<RoiIdMinter>,
    sink: Option<Arc<dyn PolygonSink>>,
    revision: u64,
}

impl std::fmt::Debug for GeometryCapture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeometryCapture")
            .field("video_id", &self.video_id)
            .field("state", &self.state)
            .field("frame", &self.frame)
            .field("points", &self.points)
            .field("has_sink", &self.sink.is_some())
            .finish_non_exhaustive()
    }
}

impl GeometryCapture {
    pub fn new(video_id: VideoId, minter: Arc<RoiIdMinter>) -> Self {
        Self {
            video_id,
            state: CaptureState::Inactive,
            frame: FrameSize::default(),
            points: Vec::new(),
            minter,
            sink: None,
            revision: 0,
        }
    }

    /// Forward committed polygons to `sink` (normally the ROI store).
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn PolygonSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn video_id(&self) -> &VideoId {
        &self.video_id
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn frame(&self) -> FrameSize {
        self.frame
    }

    /// The open sequence in insertion order.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Bumped on every change a renderer would need to redraw for.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_active(&self) -> bool {
        self.state != CaptureState::Inactive
    }

    /// Enter drawing mode over `frame`. Re-entering while active restarts
    /// with an empty sequence.
    ///
    /// # Errors
    /// [`CaptureError::FrameNotReady`] if the frame is undecoded or has a
    /// zero dimension.
    pub fn enter(&mut self, frame: &ReferenceFrame) -> Result<(), CaptureError> {
        if !frame.is_ready() {
            return Err(CaptureError::FrameNotReady);
        }
        self.frame = frame.size;
        self.points.clear();
        self.state = CaptureState::Capturing;
        self.touch();
        info!(video = %self.video_id, width = frame.size.width, height = frame.size.height, "drawing mode entered");
        Ok(())
    }

    /// Append a vertex in frame pixels.
    ///
    /// Returns `Ok(false)` without changing anything when the point lies
    /// outside the frame.
    ///
    /// # Errors
    /// [`CaptureError::NotCapturing`] when inactive,
    /// [`CaptureError::AwaitingName`] while a closed polygon waits for a name.
    pub fn add_point(&mut self, point: Point) -> Result<bool, CaptureError> {
        self.ensure_capturing()?;
        if !point.is_within(self.frame) {
            debug!(x = point.x, y = point.y, "point outside frame ignored");
            return Ok(false);
        }
        self.points.push(point);
        self.touch();
        Ok(true)
    }

    /// Map a pointer position through `transform` and append it.
    ///
    /// # Errors
    /// Same as [`Self::add_point`].
    pub fn add_display_point(
        &mut self,
        client_x: f64,
        client_y: f64,
        transform: &ViewportTransform,
    ) -> Result<bool, CaptureError> {
        self.add_point(transform.to_frame(client_x, client_y))
    }

    /// Pop the last vertex; `Ok(None)` on an empty sequence.
    ///
    /// # Errors
    /// [`CaptureError::NotCapturing`] or [`CaptureError::AwaitingName`].
    pub fn remove_last_point(&mut self) -> Result<Option<Point>, CaptureError> {
        self.ensure_capturing()?;
        let removed = self.points.pop();
        if removed.is_some() {
            self.touch();
        }
        Ok(removed)
    }

    /// Explicit close action.
    ///
    /// # Errors
    /// See [`Self::begin_naming`].
    pub fn request_close(&mut self) -> Result<(), CaptureError> {
        self.begin_naming(CloseTrigger::CloseAction)
    }

    /// Double-activate gesture on the capture surface.
    ///
    /// # Errors
    /// See [`Self::begin_naming`].
    pub fn double_activate(&mut self) -> Result<(), CaptureError> {
        self.begin_naming(CloseTrigger::DoubleActivate)
    }

    /// Validate the open sequence and move to [`CaptureState::AwaitingName`].
    /// A repeated close while already awaiting a name is a no-op.
    ///
    /// # Errors
    /// [`CaptureError::NotCapturing`] when inactive,
    /// [`CaptureError::InsufficientPoints`] with fewer than three vertices.
    pub fn begin_naming(&mut self, trigger: CloseTrigger) -> Result<(), CaptureError> {
        match self.state {
            CaptureState::Inactive => Err(CaptureError::NotCapturing),
            CaptureState::AwaitingName => Ok(()),
            CaptureState::Capturing => {
                if self.points.len() < MIN_POLYGON_POINTS {
                    return Err(CaptureError::InsufficientPoints { found: self.points.len() });
                }
                self.state = CaptureState::AwaitingName;
                self.touch();
                debug!(?trigger, points = self.points.len(), "polygon closed, awaiting name");
                Ok(())
            }
        }
    }

    /// Name the closed polygon, hand it to the sink and keep drawing.
    ///
    /// # Errors
    /// [`CaptureError::NotAwaitingName`] unless a polygon was closed,
    /// [`CaptureError::EmptyName`] for a blank name. Neither changes state.
    pub fn commit(&mut self, name: &str) -> Result<PolygonRoi, CaptureError> {
        if self.state != CaptureState::AwaitingName {
            return Err(CaptureError::NotAwaitingName);
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(CaptureError::EmptyName);
        }

        let polygon = PolygonRoi {
            id: self.minter.next_id(),
            name: name.to_string(),
            points: std::mem::take(&mut self.points),
            category: None,
        };
        self.state = CaptureState::Capturing;
        self.touch();

        info!(video = %self.video_id, roi_id = %polygon.id, name = %polygon.name, points = polygon.points.len(), "polygon committed");
        if let Some(sink) = &self.sink {
            sink.accept(&self.video_id, polygon.clone());
        }
        Ok(polygon)
    }

    /// Drop the open sequence and any pending name prompt.
    pub fn cancel(&mut self) {
        if self.state == CaptureState::Inactive {
            return;
        }
        self.points.clear();
        self.state = CaptureState::Capturing;
        self.touch();
    }

    /// Leave drawing mode, discarding anything uncommitted.
    pub fn exit(&mut self) {
        if self.state == CaptureState::Inactive && self.points.is_empty() {
            return;
        }
        self.points.clear();
        self.state = CaptureState::Inactive;
        self.touch();
        info!(video = %self.video_id, "drawing mode exited");
    }

    fn ensure_capturing(&self) -> Result<(), CaptureError> {
        match self.state {
            CaptureState::Capturing => Ok(()),
            CaptureState::Inactive => Err(CaptureError::NotCapturing),
            CaptureState::AwaitingName => Err(CaptureError::AwaitingName),
        }
    }

    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}

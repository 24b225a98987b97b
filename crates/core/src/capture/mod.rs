//! Polygon capture over a paused video frame.
//!
//! Pointer events arrive in display pixels together with a
//! [`ViewportTransform`]; [`GeometryCapture`] only ever sees frame pixels.

mod error;
mod id;
mod machine;
mod transform;

pub use error::CaptureError;
pub use id::RoiIdMinter;
pub use machine::{CaptureState, CloseTrigger, GeometryCapture, PolygonSink};
pub use transform::{DisplayRect, ViewportTransform};

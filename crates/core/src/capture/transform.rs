use serde::{Deserialize, Serialize};
use shelfsight_domain::{FrameSize, Point};

/// Box the capture surface occupies on screen, in display pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// Affine map from display pixels to frame pixels.
///
/// Built once from the surface's intrinsic resolution and its displayed box,
/// then passed alongside every pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportTransform {
    origin_x: f64,
    origin_y: f64,
    scale_x: f64,
    scale_y: f64,
}

impl ViewportTransform {
    pub const fn identity() -> Self {
        Self { origin_x: 0.0, origin_y: 0.0, scale_x: 1.0, scale_y: 1.0 }
    }

    /// `None` when the displayed box has no area.
    pub fn for_surface(intrinsic: FrameSize, displayed: DisplayRect) -> Option<Self> {
        if displayed.width <= 0.0 || displayed.height <= 0.0 {
            return None;
        }
        Some(Self {
            origin_x: displayed.left,
            origin_y: displayed.top,
            scale_x: f64::from(intrinsic.width) / displayed.width,
            scale_y: f64::from(intrinsic.height) / displayed.height,
        })
    }

    pub const fn scale(&self) -> (f64, f64) {
        (self.scale_x, self.scale_y)
    }

    /// Map a client-space position to the nearest frame pixel. The result may
    /// fall outside the frame; bounds are enforced by the capture.
    pub fn to_frame(&self, client_x: f64, client_y: f64) -> Point {
        let x = ((client_x - self.origin_x) * self.scale_x).round();
        let y = ((client_y - self.origin_y) * self.scale_y).round();
        Point::new(saturate(x), saturate(y))
    }
}

impl Default for ViewportTransform {
    fn default() -> Self {
        Self::identity()
    }
}

#[allow(clippy::cast_possible_truncation)]
fn saturate(value: f64) -> i32 {
    // float→int `as` casts saturate and map NaN to 0
    value as i32
}

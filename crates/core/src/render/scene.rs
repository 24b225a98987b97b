use serde::{Deserialize, Serialize};
use shelfsight_domain::{FrameSize, Point};

/// Straight RGBA colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    pub const fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// One drawing instruction, in surface pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawOp {
    /// Reference frame scaled from `source` to `dest`.
    Frame { source: FrameSize, dest: FrameSize },
    FillPolygon { points: Vec<Point>, color: Color },
    /// Closed outline including the last-to-first edge.
    StrokePolygon { points: Vec<Point>, color: Color, width: u32 },
    Label { text: String, anchor: Point, color: Color, size_px: u32 },
    /// Open outline, no closing edge.
    Polyline { points: Vec<Point>, color: Color, width: u32 },
    Marker { center: Point, radius: u32, color: Color },
}

/// Ordered list of draw operations for one redraw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub surface: FrameSize,
    pub ops: Vec<DrawOp>,
}

impl Scene {
    pub fn is_blank(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn has_frame(&self) -> bool {
        self.ops.iter().any(|op| matches!(op, DrawOp::Frame { .. }))
    }
}

/// Colours and sizes used by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderStyle {
    pub polygon_fill: Color,
    pub polygon_stroke: Color,
    pub stroke_width: u32,
    pub label_color: Color,
    pub label_size_px: u32,
    /// Vertical offset of the label from the first vertex.
    pub label_offset_y: i32,
    pub open_line: Color,
    pub open_line_width: u32,
    pub marker_color: Color,
    pub marker_radius: u32,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            polygon_fill: Color::rgba(0, 255, 0, 51),
            polygon_stroke: Color::rgba(0, 255, 0, 204),
            stroke_width: 2,
            label_color: Color::rgb(255, 255, 255),
            label_size_px: 14,
            label_offset_y: -5,
            open_line: Color::rgb(59, 130, 246),
            open_line_width: 2,
            marker_color: Color::rgb(59, 130, 246),
            marker_radius: 4,
        }
    }
}

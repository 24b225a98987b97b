use shelfsight_domain::{FrameSize, Point, PolygonRoi, ReferenceFrame, Result};

use super::scene::{DrawOp, RenderStyle, Scene};

/// Rasterizes a [`Scene`] onto a concrete surface.
pub trait RenderTarget {
    /// # Errors
    /// Implementation-specific drawing or encoding failure.
    fn present(&mut self, scene: &Scene) -> Result<()>;
}

/// Builds the scene for the capture surface. Holds no state besides style,
/// so repeated calls with the same input yield identical scenes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CanvasRenderer {
    style: RenderStyle,
}

impl CanvasRenderer {
    pub const fn new(style: RenderStyle) -> Self {
        Self { style }
    }

    pub const fn style(&self) -> &RenderStyle {
        &self.style
    }

    /// Draw order: frame, committed polygons (fill, stroke, label), then the
    /// open polyline with a marker on every vertex.
    ///
    /// An undecodable frame is skipped; everything else is still drawn.
    /// Polygon coordinates are frame pixels and are scaled to `surface`.
    pub fn render(
        &self,
        frame: &ReferenceFrame,
        surface: FrameSize,
        polygons: &[PolygonRoi],
        open: &[Point],
    ) -> Scene {
        let style = &self.style;
        let mut ops = Vec::new();

        if frame.is_ready() {
            ops.push(DrawOp::Frame { source: frame.size, dest: surface });
        }

        let scale = Scaler::new(frame.size, surface);

        for polygon in polygons.iter().filter(|p| !p.points.is_empty()) {
            let points = scale.all(&polygon.points);
            let first = points[0];
            ops.push(DrawOp::FillPolygon { points: points.clone(), color: style.polygon_fill });
            ops.push(DrawOp::StrokePolygon {
                points,
                color: style.polygon_stroke,
                width: style.stroke_width,
            });
            ops.push(DrawOp::Label {
                text: polygon.display_name(),
                anchor: Point::new(first.x, first.y.saturating_add(style.label_offset_y)),
                color: style.label_color,
                size_px: style.label_size_px,
            });
        }

        if !open.is_empty() {
            let points = scale.all(open);
            if points.len() > 1 {
                ops.push(DrawOp::Polyline {
                    points: points.clone(),
                    color: style.open_line,
                    width: style.open_line_width,
                });
            }
            ops.extend(points.into_iter().map(|center| DrawOp::Marker {
                center,
                radius: style.marker_radius,
                color: style.marker_color,
            }));
        }

        Scene { surface, ops }
    }
}

/// Frame→surface scaling; identity when either side has no area.
struct Scaler {
    sx: f64,
    sy: f64,
}

impl Scaler {
    fn new(frame: FrameSize, surface: FrameSize) -> Self {
        if frame.is_empty() || surface.is_empty() {
            return Self { sx: 1.0, sy: 1.0 };
        }
        Self {
            sx: f64::from(surface.width) / f64::from(frame.width),
            sy: f64::from(surface.height) / f64::from(frame.height),
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn apply(&self, point: Point) -> Point {
        Point::new(
            (f64::from(point.x) * self.sx).round() as i32,
            (f64::from(point.y) * self.sy).round() as i32,
        )
    }

    fn all(&self, points: &[Point]) -> Vec<Point> {
        points.iter().map(|p| self.apply(*p)).collect()
    }
}

#[cfg(test)]
mod tests {
    use shelfsight_domain::RoiId;

    use super::*;

    fn aisle() -> PolygonRoi {
        PolygonRoi {
            id: RoiId(7),
            name: "Aisle A".into(),
            points: vec![Point::new(10, 20), Point::new(50, 20), Point::new(50, 60)],
            category: None,
        }
    }

    #[test]
    fn draws_in_layer_order() {
        let frame = ReferenceFrame::ready(100, 100);
        let scene = CanvasRenderer::default().render(
            &frame,
            FrameSize::new(100, 100),
            &[aisle()],
            &[Point::new(1, 1), Point::new(2, 2)],
        );

        let kinds: Vec<&str> = scene
            .ops
            .iter()
            .map(|op| match op {
                DrawOp::Frame { .. } => "frame",
                DrawOp::FillPolygon { .. } => "fill",
                DrawOp::StrokePolygon { .. } => "stroke",
                DrawOp::Label { .. } => "label",
                DrawOp::Polyline { .. } => "polyline",
                DrawOp::Marker { .. } => "marker",
            })
            .collect();
        assert_eq!(kinds, ["frame", "fill", "stroke", "label", "polyline", "marker", "marker"]);
    }

    #[test]
    fn label_sits_above_first_vertex() {
        let scene = CanvasRenderer::default().render(
            &ReferenceFrame::ready(100, 100),
            FrameSize::new(100, 100),
            &[aisle()],
            &[],
        );
        let label = scene.ops.iter().find_map(|op| match op {
            DrawOp::Label { text, anchor, .. } => Some((text.clone(), *anchor)),
            _ => None,
        });
        assert_eq!(label, Some(("Aisle A".to_string(), Point::new(10, 15))));
    }

    #[test]
    fn undecoded_frame_is_skipped() {
        let scene = CanvasRenderer::default().render(
            &ReferenceFrame::pending(),
            FrameSize::new(100, 100),
            &[aisle()],
            &[],
        );
        assert!(!scene.has_frame());
        assert_eq!(scene.ops.len(), 3);
    }

    #[test]
    fn polygons_scale_to_surface() {
        let scene = CanvasRenderer::default().render(
            &ReferenceFrame::ready(100, 100),
            FrameSize::new(200, 50),
            &[aisle()],
            &[],
        );
        let DrawOp::FillPolygon { points, .. } = &scene.ops[1] else {
            panic!("expected fill");
        };
        assert_eq!(points, &vec![Point::new(20, 10), Point::new(100, 10), Point::new(100, 30)]);
    }

    #[test]
    fn single_open_point_gets_marker_only() {
        let scene = CanvasRenderer::default().render(
            &ReferenceFrame::ready(10, 10),
            FrameSize::new(10, 10),
            &[],
            &[Point::new(5, 5)],
        );
        assert_eq!(scene.ops.len(), 2);
        assert!(matches!(scene.ops[1], DrawOp::Marker { .. }));
    }

    #[test]
    fn rendering_is_idempotent() {
        let renderer = CanvasRenderer::default();
        let frame = ReferenceFrame::ready(64, 48);
        let a = renderer.render(&frame, FrameSize::new(64, 48), &[aisle()], &[Point::new(3, 3)]);
        let b = renderer.render(&frame, FrameSize::new(64, 48), &[aisle()], &[Point::new(3, 3)]);
        assert_eq!(a, b);
    }
}

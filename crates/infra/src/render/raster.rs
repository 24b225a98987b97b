//! Paints a [`Scene`] into an [`RgbaImage`].
//!
//! Each draw op is rasterised into a coverage mask first and blended once, so
//! overlapping stroke segments never darken their joints.

use std::path::Path;

use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba, RgbaImage};
use shelfsight_core::{Color, DrawOp, RenderTarget, Scene};
use shelfsight_domain::{FrameSize, Point, Result, ShelfSightError};
use tracing::debug;

use crate::errors::InfraError;

const BACKGROUND: Rgba<u8> = Rgba([0, 0, 0, 255]);
const LABEL_PADDING: u32 = 2;
const LABEL_BADGE_ALPHA: u8 = 160;

/// Image-backed [`RenderTarget`].
#[derive(Debug, Clone)]
pub struct RasterCanvas {
    frame: Option<RgbaImage>,
    canvas: RgbaImage,
}

impl Default for RasterCanvas {
    fn default() -> Self {
        Self::blank()
    }
}

impl RasterCanvas {
    /// Canvas with no reference frame; `Frame` ops fail.
    pub fn blank() -> Self {
        Self { frame: None, canvas: RgbaImage::new(0, 0) }
    }

    pub fn from_frame(frame: &DynamicImage) -> Self {
        Self { frame: Some(frame.to_rgba8()), canvas: RgbaImage::new(0, 0) }
    }

    /// Decode the reference frame from disk.
    ///
    /// # Errors
    /// `NotFound` for a missing file, `Render` for an undecodable one.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let frame = image::open(path.as_ref()).map_err(InfraError::from)?;
        Ok(Self::from_frame(&frame))
    }

    /// Intrinsic size of the loaded frame, if any.
    pub fn frame_size(&self) -> Option<FrameSize> {
        self.frame.as_ref().map(|frame| FrameSize::new(frame.width(), frame.height()))
    }

    pub fn image(&self) -> &RgbaImage {
        &self.canvas
    }

    pub fn into_image(self) -> RgbaImage {
        self.canvas
    }

    /// Encode the last presented scene; format follows the extension.
    ///
    /// # Errors
    /// `Render` when nothing was presented yet or encoding fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        if self.canvas.width() == 0 || self.canvas.height() == 0 {
            return Err(ShelfSightError::Render("nothing has been presented yet".into()));
        }
        self.canvas.save(path.as_ref()).map_err(InfraError::from)?;
        Ok(())
    }

    fn draw_frame(&mut self, dest: FrameSize) -> Result<()> {
        let frame = self
            .frame
            .as_ref()
            .ok_or_else(|| ShelfSightError::Render("scene draws a frame but no frame is loaded".into()))?;

        if frame.dimensions() == (dest.width, dest.height) {
            imageops::replace(&mut self.canvas, frame, 0, 0);
        } else {
            let scaled = imageops::resize(frame, dest.width, dest.height, FilterType::Triangle);
            imageops::replace(&mut self.canvas, &scaled, 0, 0);
        }
        Ok(())
    }
}

impl RenderTarget for RasterCanvas {
    fn present(&mut self, scene: &Scene) -> Result<()> {
        if scene.surface.is_empty() {
            return Err(ShelfSightError::Render("cannot present onto an empty surface".into()));
        }

        self.canvas = RgbaImage::from_pixel(scene.surface.width, scene.surface.height, BACKGROUND);

        for op in &scene.ops {
            match op {
                DrawOp::Frame { dest, .. } => self.draw_frame(*dest)?,
                DrawOp::FillPolygon { points, color } => {
                    let mut mask = Mask::for_image(&self.canvas);
                    mask.fill_polygon(points);
                    mask.blend_into(&mut self.canvas, *color);
                }
                DrawOp::StrokePolygon { points, color, width } => {
                    let mut mask = Mask::for_image(&self.canvas);
                    mask.stroke_path(points, *width, true);
                    mask.blend_into(&mut self.canvas, *color);
                }
                DrawOp::Polyline { points, color, width } => {
                    let mut mask = Mask::for_image(&self.canvas);
                    mask.stroke_path(points, *width, false);
                    mask.blend_into(&mut self.canvas, *color);
                }
                DrawOp::Marker { center, radius, color } => {
                    let mut mask = Mask::for_image(&self.canvas);
                    mask.disc(f64::from(center.x), f64::from(center.y), f64::from(*radius));
                    mask.blend_into(&mut self.canvas, *color);
                }
                DrawOp::Label { text, anchor, color, size_px } => {
                    if text.trim().is_empty() {
                        continue;
                    }
                    let mut mask = Mask::for_image(&self.canvas);
                    mask.rect(label_badge(text, *anchor, *size_px));
                    mask.blend_into(&mut self.canvas, Color { a: LABEL_BADGE_ALPHA.min(color.a), ..*color });
                }
            }
        }

        debug!(width = scene.surface.width, height = scene.surface.height, ops = scene.ops.len(), "scene presented");
        Ok(())
    }
}

/// Badge bounds `(left, top, right, bottom)`, bottom edge on the anchor.
fn label_badge(text: &str, anchor: Point, size_px: u32) -> (i64, i64, i64, i64) {
    let glyph_width = i64::from(size_px.max(1)) * 3 / 5;
    let chars = i64::try_from(text.chars().count()).unwrap_or(i64::MAX / 4);
    let padding = i64::from(LABEL_PADDING);
    let left = i64::from(anchor.x) - padding;
    let right = i64::from(anchor.x) + chars.saturating_mul(glyph_width) + padding;
    let bottom = i64::from(anchor.y) + padding;
    let top = i64::from(anchor.y) - i64::from(size_px) - padding;
    (left, top, right, bottom)
}

/* -------------------------------------------------------------------------- */
/* Coverage mask */
/* -------------------------------------------------------------------------- */

struct Mask {
    width: u32,
    height: u32,
    covered: Vec<bool>,
}

impl Mask {
    fn for_image(image: &RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        let len = usize::try_from(u64::from(width) * u64::from(height)).unwrap_or(0);
        Self { width, height, covered: vec![false; len] }
    }

    fn set(&mut self, x: i64, y: i64) {
        let (Ok(x), Ok(y)) = (u32::try_from(x), u32::try_from(y)) else {
            return;
        };
        if x < self.width && y < self.height {
            let index = y as usize * self.width as usize + x as usize;
            self.covered[index] = true;
        }
    }

    /// Pixel rows and columns whose centres may fall inside `[min, max]`.
    fn clamp_span(&self, min: f64, max: f64, limit: u32) -> Option<(i64, i64)> {
        let start = (min - 0.5).ceil().max(0.0);
        let end = (max - 0.5).floor().min(f64::from(limit) - 1.0);
        #[allow(clippy::cast_possible_truncation)]
        (start <= end).then(|| (start as i64, end as i64))
    }

    /// Even-odd scanline fill sampled at pixel centres.
    fn fill_polygon(&mut self, points: &[Point]) {
        if points.len() < 3 {
            return;
        }
        let min_y = points.iter().map(|p| f64::from(p.y)).fold(f64::INFINITY, f64::min);
        let max_y = points.iter().map(|p| f64::from(p.y)).fold(f64::NEG_INFINITY, f64::max);
        let Some((row_start, row_end)) = self.clamp_span(min_y, max_y, self.height) else {
            return;
        };

        let mut crossings = Vec::with_capacity(points.len());
        for row in row_start..=row_end {
            #[allow(clippy::cast_precision_loss)]
            let sample_y = row as f64 + 0.5;
            crossings.clear();

            for (index, a) in points.iter().enumerate() {
                let b = points[(index + 1) % points.len()];
                let (ax, ay, bx, by) = (f64::from(a.x), f64::from(a.y), f64::from(b.x), f64::from(b.y));
                if (ay <= sample_y && sample_y < by) || (by <= sample_y && sample_y < ay) {
                    crossings.push(ax + (sample_y - ay) * (bx - ax) / (by - ay));
                }
            }
            crossings.sort_by(f64::total_cmp);

            for pair in crossings.chunks_exact(2) {
                if let Some((col_start, col_end)) = self.clamp_span(pair[0], pair[1], self.width) {
                    for col in col_start..=col_end {
                        self.set(col, row);
                    }
                }
            }
        }
    }

    fn stroke_path(&mut self, points: &[Point], width: u32, closed: bool) {
        let half = (f64::from(width) / 2.0).max(0.5);
        match points {
            [] => {}
            [only] => self.disc(f64::from(only.x), f64::from(only.y), half),
            _ => {
                for pair in points.windows(2) {
                    self.segment(pair[0], pair[1], half);
                }
                if closed && points.len() > 2 {
                    if let (Some(last), Some(first)) = (points.last(), points.first()) {
                        self.segment(*last, *first, half);
                    }
                }
            }
        }
    }

    fn segment(&mut self, a: Point, b: Point, half: f64) {
        let (ax, ay, bx, by) = (f64::from(a.x), f64::from(a.y), f64::from(b.x), f64::from(b.y));
        let Some((cols, rows)) = self
            .clamp_span(ax.min(bx) - half, ax.max(bx) + half, self.width)
            .zip(self.clamp_span(ay.min(by) - half, ay.max(by) + half, self.height))
        else {
            return;
        };

        let (dx, dy) = (bx - ax, by - ay);
        let length_sq = dx * dx + dy * dy;
        for row in rows.0..=rows.1 {
            for col in cols.0..=cols.1 {
                #[allow(clippy::cast_precision_loss)]
                let (px, py) = (col as f64 + 0.5, row as f64 + 0.5);
                let t = if length_sq == 0.0 { 0.0 } else { (((px - ax) * dx + (py - ay) * dy) / length_sq).clamp(0.0, 1.0) };
                let (nx, ny) = (ax + t * dx - px, ay + t * dy - py);
                if nx * nx + ny * ny <= half * half {
                    self.set(col, row);
                }
            }
        }
    }

    fn disc(&mut self, cx: f64, cy: f64, radius: f64) {
        let Some((cols, rows)) = self
            .clamp_span(cx - radius, cx + radius, self.width)
            .zip(self.clamp_span(cy - radius, cy + radius, self.height))
        else {
            return;
        };
        for row in rows.0..=rows.1 {
            for col in cols.0..=cols.1 {
                #[allow(clippy::cast_precision_loss)]
                let (dx, dy) = (col as f64 + 0.5 - cx, row as f64 + 0.5 - cy);
                if dx * dx + dy * dy <= radius * radius {
                    self.set(col, row);
                }
            }
        }
    }

    fn rect(&mut self, (left, top, right, bottom): (i64, i64, i64, i64)) {
        for row in top.max(0)..bottom.min(i64::from(self.height)) {
            for col in left.max(0)..right.min(i64::from(self.width)) {
                self.set(col, row);
            }
        }
    }

    fn blend_into(&self, image: &mut RgbaImage, color: Color) {
        if color.a == 0 {
            return;
        }
        for (index, pixel) in image.pixels_mut().enumerate() {
            if self.covered.get(index).copied().unwrap_or(false) {
                *pixel = blend(*pixel, color);
            }
        }
    }
}

/// Source-over compositing of a straight-alpha colour.
fn blend(dst: Rgba<u8>, src: Color) -> Rgba<u8> {
    let alpha = u32::from(src.a);
    let inverse = 255 - alpha;
    let channel = |s: u8, d: u8| -> u8 {
        let value = (u32::from(s) * alpha + u32::from(d) * inverse + 127) / 255;
        u8::try_from(value).unwrap_or(u8::MAX)
    };
    let out_alpha = alpha + (u32::from(dst[3]) * inverse + 127) / 255;
    Rgba([
        channel(src.r, dst[0]),
        channel(src.g, dst[1]),
        channel(src.b, dst[2]),
        u8::try_from(out_alpha).unwrap_or(u8::MAX),
    ])
}

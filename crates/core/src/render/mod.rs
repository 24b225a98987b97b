//! Scene building for the capture surface.
//!
//! [`CanvasRenderer`] is a pure function from (frame, committed polygons,
//! open points) to a [`Scene`]; a [`RenderTarget`] adapter rasterizes it.

mod renderer;
mod scene;

pub use renderer::{CanvasRenderer, RenderTarget};
pub use scene::{Color, DrawOp, RenderStyle, Scene};

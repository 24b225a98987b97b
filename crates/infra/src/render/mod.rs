//! Raster backend for capture scenes

mod raster;

pub use raster::RasterCanvas;

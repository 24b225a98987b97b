//! Commands - the operations exposed to the binary and other front ends

mod analysis;
mod capture;
mod diagnostics;
mod rois;
mod videos;

pub use analysis::*;
pub use capture::*;
pub use diagnostics::*;
pub use rois::*;
pub use videos::*;

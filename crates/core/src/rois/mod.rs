//! ROI staging and persistence.

mod error;
pub mod ports;
mod store;

pub use error::RoiError;
pub use store::RoiStore;

//! Geometry utilities: pixel rectangles and sensor-to-image projection.

pub mod projection;
pub mod rect;

pub use projection::{Calibration, Projector};
pub use rect::Roi;

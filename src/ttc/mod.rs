//! Time-to-collision estimators.
//!
//! Both estimators return `Ok(seconds)` or an explicit [`FusionError`] when
//! the TTC is undefined; they never hand back NaN or infinity.
//!
//! [`FusionError`]: crate::error::FusionError

pub mod range;
pub mod stats;
pub mod vision;

pub use range::{compute_ttc_range, robust_closest_distance, ttc_from_distances};
pub use vision::{compute_ttc_camera, distance_ratios, ttc_from_ratio};

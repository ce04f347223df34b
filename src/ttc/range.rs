//! Range-based TTC from two point sets of the same tracked object.
//!
//! Under a constant-velocity model the object closes `d_prev - d_curr` metres
//! per frame, so
//!
//! ```text
//! TTC = d_curr / ((d_prev - d_curr) * frame_rate)
//! ```
//!
//! The closest point of a set is a poor distance estimate: one spurious return
//! in front of the object dominates it. Instead each set contributes a low
//! order statistic of its forward coordinates (see [`RangeTtcConfig`]).

use tracing::debug;

use crate::config::RangeTtcConfig;
use crate::error::{Degeneracy, FusionError};
use crate::frame::RangePoint;
use crate::ttc::stats::percentile_rank;

/// Distance changes at or below this (metres) count as no relative motion.
const MIN_DISTANCE_CHANGE: f64 = 1e-9;

/// Robust closest forward distance of a point set.
///
/// Fails with [`FusionError::InsufficientData`] when the set is smaller than
/// `min_points` or than the selected rank requires.
pub fn robust_closest_distance(
    points: &[RangePoint],
    config: &RangeTtcConfig,
) -> Result<f64, FusionError> {
    let n = points.len();
    let rank = percentile_rank(n, config.closest_percentile, config.rank_floor);
    let required = config.min_points.max(rank.saturating_add(1));
    if n < required {
        return Err(FusionError::InsufficientData {
            required,
            available: n,
        });
    }

    let mut xs: Vec<f64> = points.iter().map(|p| p.x).collect();
    let (_, nth, _) = xs.select_nth_unstable_by(rank, f64::total_cmp);
    Ok(*nth)
}

/// TTC from two robust distances taken `1 / frame_rate` seconds apart.
///
/// Negative values mean the object is moving away. Equal distances make the
/// TTC infinite and are reported as [`Degeneracy::NoRelativeMotion`].
pub fn ttc_from_distances(d_prev: f64, d_curr: f64, frame_rate: f64) -> Result<f64, FusionError> {
    if !(frame_rate.is_finite() && frame_rate > 0.0) {
        return Err(FusionError::DegenerateGeometry(Degeneracy::InvalidFrameRate));
    }
    let closing = d_prev - d_curr;
    if !(closing.abs() > MIN_DISTANCE_CHANGE) {
        return Err(FusionError::DegenerateGeometry(Degeneracy::NoRelativeMotion));
    }
    Ok(d_curr / (closing * frame_rate))
}

/// Range-sensor TTC between the previous and current point sets of one object.
pub fn compute_ttc_range(
    points_prev: &[RangePoint],
    points_curr: &[RangePoint],
    frame_rate: f64,
    config: &RangeTtcConfig,
) -> Result<f64, FusionError> {
    let d_prev = robust_closest_distance(points_prev, config)?;
    let d_curr = robust_closest_distance(points_curr, config)?;
    let ttc = ttc_from_distances(d_prev, d_curr, frame_rate)?;

    debug!(
        d_prev,
        d_curr,
        closing_speed = (d_prev - d_curr) * frame_rate,
        ttc,
        "range TTC"
    );
    Ok(ttc)
}

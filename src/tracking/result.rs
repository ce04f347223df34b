//! Per-step results handed to the reporting collaborator.
//!
//! These types describe what happened during one processing step:
//! - which previous regions were carried to which current regions
//! - the two TTC estimates per tracked object, or why each is undefined
//! - per-region range statistics for top-view reporting
//! - association counts and timing information

use crate::association::AssociationStats;
use crate::error::FusionError;
use crate::frame::{BoxId, DetectedRegion, RegionIdentityMap};

/// Outcome of one step.
#[derive(Debug, Clone)]
pub struct StepResult {
    pub frame_id: u64,
    /// Previous box id to current box id. Empty on the first step.
    pub identity_map: RegionIdentityMap,
    /// One entry per identity-map entry, in previous box id order.
    pub tracked: Vec<TrackedObject>,
    /// One entry per current region that owns at least one range point.
    pub summaries: Vec<RegionSummary>,
    pub association: AssociationStats,
    pub timing: TimingStats,
}

impl StepResult {
    pub fn tracked_object(&self, curr_box_id: BoxId) -> Option<&TrackedObject> {
        self.tracked.iter().find(|t| t.curr_box_id == curr_box_id)
    }
}

/// A region present in both frames with its two TTC estimates.
///
/// `Err` means the estimate is undefined for this step, with the reason.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedObject {
    pub prev_box_id: BoxId,
    pub curr_box_id: BoxId,
    pub ttc_range: Result<f64, FusionError>,
    pub ttc_vision: Result<f64, FusionError>,
    pub n_range_points_prev: usize,
    pub n_range_points_curr: usize,
    pub n_correspondences: usize,
}

/// Range statistics of one region, as shown in a top view of the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionSummary {
    pub box_id: BoxId,
    pub num_points: usize,
    /// Closest forward coordinate (m).
    pub x_min: f64,
    /// Lateral extent `y_max - y_min` (m).
    pub width: f64,
}

impl RegionSummary {
    /// Summarize a region's owned range points. `None` if it owns none.
    pub fn from_region(region: &DetectedRegion) -> Option<Self> {
        let first = region.range_points.first()?;
        let (mut x_min, mut y_min, mut y_max) = (first.x, first.y, first.y);
        for p in &region.range_points[1..] {
            x_min = x_min.min(p.x);
            y_min = y_min.min(p.y);
            y_max = y_max.max(p.y);
        }
        Some(Self {
            box_id: region.box_id,
            num_points: region.range_points.len(),
            x_min,
            width: y_max - y_min,
        })
    }
}

/// Timing breakdown for a step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingStats {
    pub total_ms: f64,
    pub range_association_ms: f64,
    pub keypoint_association_ms: f64,
    pub matching_ms: f64,
    pub estimation_ms: f64,
}

impl TimingStats {
    pub fn zero() -> Self {
        Self {
            total_ms: 0.0,
            range_association_ms: 0.0,
            keypoint_association_ms: 0.0,
            matching_ms: 0.0,
            estimation_ms: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::RangePoint;
    use crate::geometry::Roi;
    use approx::assert_relative_eq;

    #[test]
    fn test_region_summary() {
        let mut region = DetectedRegion::new(BoxId(3), Roi::new(0.0, 0.0, 10.0, 10.0));
        assert!(RegionSummary::from_region(&region).is_none());

        region.range_points = vec![
            RangePoint::new(8.2, -0.7, -1.0),
            RangePoint::new(7.9, 0.1, -1.0),
            RangePoint::new(8.0, 0.8, -1.1),
        ];
        let summary = RegionSummary::from_region(&region).unwrap();
        assert_eq!(summary.box_id, BoxId(3));
        assert_eq!(summary.num_points, 3);
        assert_relative_eq!(summary.x_min, 7.9);
        assert_relative_eq!(summary.width, 1.5, epsilon = 1e-12);
    }
}

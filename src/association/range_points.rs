//! Assign range points to the detected region that contains their projection.
//!
//! Regions are shrunk toward their centers before the containment test so
//! that returns from the background just outside an object's silhouette,
//! which detector boxes usually include, are not attributed to the object. A
//! point is kept only when exactly one shrunk region contains it; points in
//! overlapping regions cannot be attributed reliably and are dropped for the
//! step.
//!
//! Cost is `O(points × regions)`.

use nalgebra::Point2;
use tracing::{debug, trace};

use crate::config::RangeCrop;
use crate::error::FusionError;
use crate::frame::{DetectedRegion, RangePoint};
use crate::geometry::{Projector, Roi};

/// Outcome of the containment test for a single projected point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enclosure {
    /// No region contains the point.
    Outside,
    /// Exactly one region, by index into the region slice.
    Unique(usize),
    /// Two or more regions contain the point.
    Ambiguous,
}

/// Counts of how the points of one association pass were resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssociationStats {
    pub assigned: usize,
    pub ambiguous: usize,
    pub outside: usize,
    /// Points that projected with non-positive depth.
    pub behind_sensor: usize,
}

impl AssociationStats {
    pub fn dropped(&self) -> usize {
        self.ambiguous + self.outside + self.behind_sensor
    }
}

/// Find which of `rois` contain `pixel`.
pub fn enclosing_region(rois: &[Roi], pixel: &Point2<f64>) -> Enclosure {
    let mut found = None;
    for (idx, roi) in rois.iter().enumerate() {
        if roi.contains(pixel) {
            if found.is_some() {
                return Enclosure::Ambiguous;
            }
            found = Some(idx);
        }
    }
    match found {
        Some(idx) => Enclosure::Unique(idx),
        None => Enclosure::Outside,
    }
}

/// Append every range point to the one region whose shrunk rectangle contains
/// its projection.
///
/// `shrink_factor` must lie in `[0, 1)`. Regions are mutated in place; points
/// already owned by a region are kept.
pub fn cluster_range_points(
    regions: &mut [DetectedRegion],
    points: &[RangePoint],
    shrink_factor: f64,
    projector: &Projector,
) -> Result<AssociationStats, FusionError> {
    if !(0.0..1.0).contains(&shrink_factor) {
        return Err(FusionError::InvalidConfig(format!(
            "shrink_factor must be in [0, 1), got {shrink_factor}"
        )));
    }

    let shrunk: Vec<Roi> = regions.iter().map(|r| r.roi.shrunk(shrink_factor)).collect();
    let mut stats = AssociationStats::default();

    for point in points {
        let pixel = match projector.project(&point.position()) {
            Ok(px) => px,
            Err(_) => {
                trace!(x = point.x, y = point.y, z = point.z, "range point behind image plane");
                stats.behind_sensor += 1;
                continue;
            }
        };

        match enclosing_region(&shrunk, &pixel) {
            Enclosure::Unique(idx) => {
                regions[idx].range_points.push(*point);
                stats.assigned += 1;
            }
            Enclosure::Ambiguous => {
                trace!(u = pixel.x, v = pixel.y, "range point in overlapping regions");
                stats.ambiguous += 1;
            }
            Enclosure::Outside => stats.outside += 1,
        }
    }

    debug!(
        n_points = points.len(),
        n_regions = regions.len(),
        assigned = stats.assigned,
        ambiguous = stats.ambiguous,
        outside = stats.outside,
        behind = stats.behind_sensor,
        "range point association"
    );
    Ok(stats)
}

/// Keep only the points inside `crop`.
pub fn crop_range_points(points: &[RangePoint], crop: &RangeCrop) -> Vec<RangePoint> {
    points.iter().filter(|p| crop.contains(p)).copied().collect()
}

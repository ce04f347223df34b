//! Attach keypoint correspondences to the region that contains them.
//!
//! Unlike range points, correspondences are not exclusive: when rectangles
//! overlap, a correspondence is recorded under every region containing its
//! current-frame keypoint.

use tracing::debug;

use crate::error::{FrameSide, FusionError};
use crate::frame::{Correspondence, DetectedRegion, Keypoint};

/// Append to `region` every correspondence whose current-frame keypoint lies
/// inside the region's (unshrunk) rectangle, together with that keypoint.
///
/// Returns the number of correspondences added. Fails without modifying the
/// region if any correspondence references a missing keypoint.
pub fn cluster_keypoint_matches(
    region: &mut DetectedRegion,
    kpts_prev: &[Keypoint],
    kpts_curr: &[Keypoint],
    correspondences: &[Correspondence],
) -> Result<usize, FusionError> {
    let mut contained = Vec::new();
    for (index, c) in correspondences.iter().enumerate() {
        if c.prev_idx >= kpts_prev.len() {
            return Err(FusionError::CorrespondenceOutOfRange {
                index,
                keypoint: c.prev_idx,
                side: FrameSide::Previous,
                len: kpts_prev.len(),
            });
        }
        let kp_curr = kpts_curr
            .get(c.curr_idx)
            .ok_or(FusionError::CorrespondenceOutOfRange {
                index,
                keypoint: c.curr_idx,
                side: FrameSide::Current,
                len: kpts_curr.len(),
            })?;

        if region.roi.contains(&kp_curr.pt) {
            contained.push((*c, *kp_curr));
        }
    }

    let added = contained.len();
    for (c, kp) in contained {
        region.correspondences.push(c);
        region.keypoints.push(kp);
    }

    debug!(box_id = %region.box_id, added, "keypoint association");
    Ok(added)
}

/// Remove correspondences whose pixel displacement between frames exceeds
/// `max_ratio` times the mean displacement of the region's correspondences.
///
/// Keeps `region.correspondences` and `region.keypoints` aligned. Returns the
/// number removed.
pub fn filter_by_displacement(
    region: &mut DetectedRegion,
    kpts_prev: &[Keypoint],
    kpts_curr: &[Keypoint],
    max_ratio: f64,
) -> usize {
    let displacement = |c: &Correspondence| -> Option<f64> {
        let prev = kpts_prev.get(c.prev_idx)?;
        let curr = kpts_curr.get(c.curr_idx)?;
        Some((curr.pt - prev.pt).norm())
    };

    let displacements: Vec<Option<f64>> = region.correspondences.iter().map(displacement).collect();
    let valid: Vec<f64> = displacements.iter().flatten().copied().collect();
    if valid.is_empty() {
        return 0;
    }
    let mean = valid.iter().sum::<f64>() / valid.len() as f64;
    let limit = max_ratio * mean;

    let before = region.correspondences.len();
    let keep: Vec<bool> = displacements.iter().map(|d| d.is_some_and(|d| d <= limit)).collect();
    let mut flags = keep.iter();
    region.correspondences.retain(|_| flags.next().copied().unwrap_or(false));
    let mut flags = keep.iter();
    region.keypoints.retain(|_| flags.next().copied().unwrap_or(false));

    let removed = before - region.correspondences.len();
    if removed > 0 {
        debug!(box_id = %region.box_id, removed, mean, "displacement filter");
    }
    removed
}

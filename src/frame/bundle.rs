//! The unit of per-step input: regions, keypoints, range points and the
//! correspondences linking this step's keypoints to the previous step's.

use std::collections::BTreeMap;

use crate::error::{FrameSide, FusionError};
use crate::frame::region::DetectedRegion;
use crate::frame::types::{BoxId, Correspondence, Keypoint, RangePoint};

/// Previous-frame box id to current-frame box id.
///
/// One entry per previous region that received at least one vote. This is the
/// only state that survives the step boundary.
pub type RegionIdentityMap = BTreeMap<BoxId, BoxId>;

/// Everything the collaborators produce for one step.
#[derive(Debug, Clone, Default)]
pub struct FrameBundle {
    /// Caller-assigned frame number, used for logging and reports.
    pub frame_id: u64,
    pub regions: Vec<DetectedRegion>,
    pub keypoints: Vec<Keypoint>,
    pub range_points: Vec<RangePoint>,
    /// Correspondences from the previous frame's keypoints to `keypoints`.
    /// Empty for the first frame of a sequence.
    pub correspondences: Vec<Correspondence>,
}

impl FrameBundle {
    pub fn new(frame_id: u64) -> Self {
        Self {
            frame_id,
            ..Default::default()
        }
    }

    pub fn region(&self, box_id: BoxId) -> Option<&DetectedRegion> {
        self.regions.iter().find(|r| r.box_id == box_id)
    }

    pub fn region_mut(&mut self, box_id: BoxId) -> Option<&mut DetectedRegion> {
        self.regions.iter_mut().find(|r| r.box_id == box_id)
    }
}

/// Verify that every correspondence references existing keypoints in both
/// frames.
pub fn check_correspondences(
    correspondences: &[Correspondence],
    kpts_prev: &[Keypoint],
    kpts_curr: &[Keypoint],
) -> Result<(), FusionError> {
    for (index, c) in correspondences.iter().enumerate() {
        if c.prev_idx >= kpts_prev.len() {
            return Err(FusionError::CorrespondenceOutOfRange {
                index,
                keypoint: c.prev_idx,
                side: FrameSide::Previous,
                len: kpts_prev.len(),
            });
        }
        if c.curr_idx >= kpts_curr.len() {
            return Err(FusionError::CorrespondenceOutOfRange {
                index,
                keypoint: c.curr_idx,
                side: FrameSide::Current,
                len: kpts_curr.len(),
            });
        }
    }
    Ok(())
}

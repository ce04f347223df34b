//! Detected regions and the per-step data they own.

use crate::frame::types::{BoxId, Correspondence, Keypoint, RangePoint};
use crate::geometry::Roi;

/// An object detection for one step, annotated by the associators.
///
/// Created fresh each step from the detector output. The region exclusively
/// owns the range points and correspondences assigned to it for that step.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedRegion {
    pub box_id: BoxId,
    pub roi: Roi,
    /// Detector class, when reported.
    pub class_id: Option<u32>,
    /// Detector confidence in `[0, 1]`, when reported.
    pub confidence: Option<f64>,
    /// Range points whose projection falls inside exactly this region.
    pub range_points: Vec<RangePoint>,
    /// Correspondences whose current-frame keypoint lies in `roi`.
    pub correspondences: Vec<Correspondence>,
    /// Current-frame keypoints, `keypoints[i]` belongs to `correspondences[i]`.
    pub keypoints: Vec<Keypoint>,
}

impl DetectedRegion {
    pub fn new(box_id: BoxId, roi: Roi) -> Self {
        Self {
            box_id,
            roi,
            class_id: None,
            confidence: None,
            range_points: Vec::new(),
            correspondences: Vec::new(),
            keypoints: Vec::new(),
        }
    }

    pub fn with_detection(mut self, class_id: u32, confidence: f64) -> Self {
        self.class_id = Some(class_id);
        self.confidence = Some(confidence);
        self
    }

    /// Drop everything the associators attached.
    pub fn clear_associations(&mut self) {
        self.range_points.clear();
        self.correspondences.clear();
        self.keypoints.clear();
    }
}

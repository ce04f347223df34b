//! Per-step driver: association, region matching and TTC estimation.
//!
//! The tracker holds exactly one annotated frame from the previous step. Each
//! call to [`FusionTracker::process_step`]:
//! - crops and assigns the new frame's range points to its regions
//! - assigns keypoint correspondences to the new frame's regions
//! - matches previous regions to current regions by correspondence votes
//! - runs both TTC estimators for every matched pair
//! - replaces the stored frame with the newly annotated one

use std::time::Instant;

use tracing::{debug, info, warn};

use crate::association::{
    cluster_keypoint_matches, cluster_range_points, crop_range_points, filter_by_displacement,
    match_bounding_boxes,
};
use crate::config::FusionConfig;
use crate::error::FusionError;
use crate::frame::{FrameBundle, RegionIdentityMap};
use crate::geometry::{Calibration, Projector};
use crate::tracking::result::{RegionSummary, StepResult, TimingStats, TrackedObject};
use crate::ttc::{compute_ttc_camera, compute_ttc_range};

/// Synchronous fusion tracker over a stream of frame bundles.
pub struct FusionTracker {
    config: FusionConfig,
    projector: Projector,
    /// Annotated frame from the previous step.
    prev_frame: Option<FrameBundle>,
    /// Running step counter.
    frame_count: usize,
}

impl FusionTracker {
    pub fn new(calibration: &Calibration, config: FusionConfig) -> Result<Self, FusionError> {
        config.validate()?;
        Ok(Self {
            config,
            projector: Projector::new(calibration),
            prev_frame: None,
            frame_count: 0,
        })
    }

    /// Number of steps processed so far.
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// The most recently processed frame, with its regions annotated.
    pub fn last_frame(&self) -> Option<&FrameBundle> {
        self.prev_frame.as_ref()
    }

    /// Forget the previous frame; the next step starts a new sequence.
    pub fn reset(&mut self) {
        self.prev_frame = None;
    }

    /// Process one step and return the tracked objects with their TTCs.
    ///
    /// A single object's undefined TTC never fails the step. The step fails
    /// on malformed correspondences; the frame is still stored so that the
    /// next step's correspondences refer to the right keypoints.
    pub fn process_step(&mut self, mut bundle: FrameBundle) -> Result<StepResult, FusionError> {
        let t_start = Instant::now();
        let mut timing = TimingStats::zero();
        self.frame_count += 1;

        for region in &mut bundle.regions {
            region.clear_associations();
        }
        if let Some(crop) = &self.config.crop {
            let before = bundle.range_points.len();
            bundle.range_points = crop_range_points(&bundle.range_points, crop);
            debug!(before, after = bundle.range_points.len(), "range crop");
        }

        let t = Instant::now();
        let association = cluster_range_points(
            &mut bundle.regions,
            &bundle.range_points,
            self.config.shrink_factor,
            &self.projector,
        )?;
        timing.range_association_ms = elapsed_ms(t);

        let summaries: Vec<RegionSummary> = bundle
            .regions
            .iter()
            .filter_map(RegionSummary::from_region)
            .collect();

        let prev = self.prev_frame.take();
        let tracked = match &prev {
            Some(prev) => self.track(prev, &mut bundle, &mut timing),
            None => {
                if !bundle.correspondences.is_empty() {
                    warn!(
                        frame_id = bundle.frame_id,
                        n = bundle.correspondences.len(),
                        "correspondences on first frame ignored"
                    );
                }
                Ok((RegionIdentityMap::new(), Vec::new()))
            }
        };

        let frame_id = bundle.frame_id;
        let n_regions = bundle.regions.len();
        self.prev_frame = Some(bundle);
        let (identity_map, tracked) = tracked?;

        timing.total_ms = elapsed_ms(t_start);
        info!(
            frame_id,
            n_regions,
            n_tracked = tracked.len(),
            assigned_points = association.assigned,
            total_ms = timing.total_ms,
            "processed step"
        );

        Ok(StepResult {
            frame_id,
            identity_map,
            tracked,
            summaries,
            association,
            timing,
        })
    }

    fn track(
        &self,
        prev: &FrameBundle,
        curr: &mut FrameBundle,
        timing: &mut TimingStats,
    ) -> Result<(RegionIdentityMap, Vec<TrackedObject>), FusionError> {
        let t = Instant::now();
        for region in &mut curr.regions {
            cluster_keypoint_matches(
                region,
                &prev.keypoints,
                &curr.keypoints,
                &curr.correspondences,
            )?;
            if let Some(ratio) = self.config.keypoints.max_displacement_ratio {
                filter_by_displacement(region, &prev.keypoints, &curr.keypoints, ratio);
            }
        }
        timing.keypoint_association_ms = elapsed_ms(t);

        let t = Instant::now();
        let identity_map = match_bounding_boxes(
            &curr.correspondences,
            &prev.keypoints,
            &curr.keypoints,
            &prev.regions,
            &curr.regions,
        )?;
        timing.matching_ms = elapsed_ms(t);

        let t = Instant::now();
        let mut tracked = Vec::with_capacity(identity_map.len());
        for (&prev_id, &curr_id) in &identity_map {
            let (Some(prev_region), Some(curr_region)) =
                (prev.region(prev_id), curr.region(curr_id))
            else {
                continue;
            };

            let ttc_range = compute_ttc_range(
                &prev_region.range_points,
                &curr_region.range_points,
                self.config.frame_rate,
                &self.config.range,
            );
            let ttc_vision = compute_ttc_camera(
                &prev.keypoints,
                &curr.keypoints,
                &curr_region.correspondences,
                self.config.frame_rate,
                &self.config.vision,
            );

            if let Err(e) = &ttc_range {
                warn!(prev = %prev_id, curr = %curr_id, reason = %e, "range TTC undefined");
            }
            if let Err(e) = &ttc_vision {
                warn!(prev = %prev_id, curr = %curr_id, reason = %e, "camera TTC undefined");
            }

            tracked.push(TrackedObject {
                prev_box_id: prev_id,
                curr_box_id: curr_id,
                ttc_range,
                ttc_vision,
                n_range_points_prev: prev_region.range_points.len(),
                n_range_points_curr: curr_region.range_points.len(),
                n_correspondences: curr_region.correspondences.len(),
            });
        }
        timing.estimation_ms = elapsed_ms(t);

        Ok((identity_map, tracked))
    }
}

fn elapsed_ms(since: Instant) -> f64 {
    since.elapsed().as_secs_f64() * 1e3
}

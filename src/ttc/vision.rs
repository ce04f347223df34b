//! Vision-based TTC from the scale change of a keypoint constellation.
//!
//! For a pinhole camera the image distance between two points on a fronto-
//! parallel surface scales with `1 / d`. The ratio `h = dist_curr / dist_prev`
//! of matching pixel distances therefore equals `d_prev / d_curr`, and with a
//! constant closing speed
//!
//! ```text
//! TTC = -dT / (1 - h),   dT = 1 / frame_rate
//! ```
//!
//! Every unordered pair of owned correspondences contributes one ratio. The
//! median of the ratios resists mismatched pairs.
//!
//! Cost is quadratic in the number of correspondences owned by the region.

use tracing::debug;

use crate::config::VisionTtcConfig;
use crate::error::{Degeneracy, FrameSide, FusionError};
use crate::frame::{Correspondence, Keypoint};
use crate::ttc::stats::median_in_place;

/// Median ratios this close to 1 mean no measurable scale change.
const MIN_SCALE_CHANGE: f64 = 1e-9;

fn lookup<'a>(
    keypoints: &'a [Keypoint],
    idx: usize,
    index: usize,
    side: FrameSide,
) -> Result<&'a Keypoint, FusionError> {
    keypoints
        .get(idx)
        .ok_or(FusionError::CorrespondenceOutOfRange {
            index,
            keypoint: idx,
            side,
            len: keypoints.len(),
        })
}

/// Pairwise distance ratios `dist_curr / dist_prev` that pass both filters.
pub fn distance_ratios(
    kpts_prev: &[Keypoint],
    kpts_curr: &[Keypoint],
    correspondences: &[Correspondence],
    config: &VisionTtcConfig,
) -> Result<Vec<f64>, FusionError> {
    // resolve indices once so the pair loop only touches positions
    let mut pairs = Vec::with_capacity(correspondences.len());
    for (index, c) in correspondences.iter().enumerate() {
        let prev = lookup(kpts_prev, c.prev_idx, index, FrameSide::Previous)?;
        let curr = lookup(kpts_curr, c.curr_idx, index, FrameSide::Current)?;
        pairs.push((prev.pt, curr.pt));
    }

    let mut ratios = Vec::new();
    for (i, (outer_prev, outer_curr)) in pairs.iter().enumerate() {
        for (inner_prev, inner_curr) in &pairs[i + 1..] {
            let dist_curr = (outer_curr - inner_curr).norm();
            let dist_prev = (outer_prev - inner_prev).norm();

            if dist_prev > config.min_prev_distance && dist_curr >= config.min_pixel_distance {
                ratios.push(dist_curr / dist_prev);
            }
        }
    }
    Ok(ratios)
}

/// TTC from a scale ratio measured `1 / frame_rate` seconds apart.
pub fn ttc_from_ratio(ratio: f64, frame_rate: f64) -> Result<f64, FusionError> {
    if !(frame_rate.is_finite() && frame_rate > 0.0) {
        return Err(FusionError::DegenerateGeometry(Degeneracy::InvalidFrameRate));
    }
    let denom = 1.0 - ratio;
    if !(denom.abs() > MIN_SCALE_CHANGE) {
        return Err(FusionError::DegenerateGeometry(Degeneracy::NoRelativeMotion));
    }
    let dt = 1.0 / frame_rate;
    Ok(-dt / denom)
}

/// Camera TTC from the correspondences owned by one tracked region.
///
/// Fails with [`FusionError::InsufficientData`] when no pair survives the
/// distance filters.
pub fn compute_ttc_camera(
    kpts_prev: &[Keypoint],
    kpts_curr: &[Keypoint],
    correspondences: &[Correspondence],
    frame_rate: f64,
    config: &VisionTtcConfig,
) -> Result<f64, FusionError> {
    let mut ratios = distance_ratios(kpts_prev, kpts_curr, correspondences, config)?;
    let n_ratios = ratios.len();
    let median = median_in_place(&mut ratios).ok_or(FusionError::InsufficientData {
        required: 1,
        available: 0,
    })?;
    let ttc = ttc_from_ratio(median, frame_rate)?;

    debug!(
        n_correspondences = correspondences.len(),
        n_ratios, median, ttc, "camera TTC"
    );
    Ok(ttc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn permissive() -> VisionTtcConfig {
        VisionTtcConfig {
            min_pixel_distance: 1.0,
            min_prev_distance: f64::EPSILON,
        }
    }

    /// Keypoints on a grid around `center`, scaled by `scale`.
    fn grid(center: (f64, f64), spacing: f64, scale: f64) -> Vec<Keypoint> {
        let mut kpts = Vec::new();
        for r in -2..=2 {
            for c in -2..=2 {
                kpts.push(Keypoint::new(
                    center.0 + scale * spacing * c as f64,
                    center.1 + scale * spacing * r as f64,
                ));
            }
        }
        kpts
    }

    #[test]
    fn test_two_correspondence_reference_case() {
        // dist_prev = 10 px, dist_curr = 12 px, 10 Hz -> ratio 1.2, TTC 0.5 s
        let prev = vec![Keypoint::new(100.0, 100.0), Keypoint::new(110.0, 100.0)];
        let curr = vec![Keypoint::new(100.0, 100.0), Keypoint::new(112.0, 100.0)];
        let matches = vec![Correspondence::new(0, 0), Correspondence::new(1, 1)];

        let ratios = distance_ratios(&prev, &curr, &matches, &permissive()).unwrap();
        assert_eq!(ratios.len(), 1);
        assert_relative_eq!(ratios[0], 1.2, epsilon = 1e-12);

        let ttc = compute_ttc_camera(&prev, &curr, &matches, 10.0, &permissive()).unwrap();
        assert_relative_eq!(ttc, 0.5, epsilon = 1e-9);
    }

    #[test]
    fn test_first_correspondence_participates() {
        // the (1, 2) pair is too short; both survivors pair with correspondence 0
        let prev = vec![
            Keypoint::new(0.0, 0.0),
            Keypoint::new(200.0, 0.0),
            Keypoint::new(205.0, 0.0),
        ];
        let curr = vec![
            Keypoint::new(0.0, 0.0),
            Keypoint::new(220.0, 0.0),
            Keypoint::new(222.0, 0.0),
        ];
        let matches: Vec<_> = (0..3).map(|i| Correspondence::new(i, i)).collect();
        let config = VisionTtcConfig {
            min_pixel_distance: 100.0,
            min_prev_distance: f64::EPSILON,
        };

        let ratios = distance_ratios(&prev, &curr, &matches, &config).unwrap();
        assert_eq!(ratios.len(), 2);
        assert_relative_eq!(ratios[0], 1.1, epsilon = 1e-12);
    }

    #[test]
    fn test_uniform_scale_change() {
        let prev = grid((400.0, 200.0), 30.0, 1.0);
        let curr = grid((400.0, 200.0), 30.0, 1.05);
        let matches: Vec<_> = (0..prev.len()).map(|i| Correspondence::new(i, i)).collect();

        let ttc = compute_ttc_camera(&prev, &curr, &matches, 10.0, &permissive()).unwrap();
        assert_relative_eq!(ttc, 0.1 / 0.05, epsilon = 1e-6);
    }

    #[test]
    fn test_median_rejects_mismatched_pair() {
        let prev = grid((400.0, 200.0), 30.0, 1.0);
        let mut curr = grid((400.0, 200.0), 30.0, 1.05);
        // one wild mismatch
        curr[3] = Keypoint::new(5.0, 5.0);
        let matches: Vec<_> = (0..prev.len()).map(|i| Correspondence::new(i, i)).collect();

        let ttc = compute_ttc_camera(&prev, &curr, &matches, 10.0, &permissive()).unwrap();
        assert_relative_eq!(ttc, 2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_no_surviving_ratio_is_insufficient_data() {
        let prev = vec![Keypoint::new(0.0, 0.0), Keypoint::new(10.0, 0.0)];
        let curr = vec![Keypoint::new(0.0, 0.0), Keypoint::new(12.0, 0.0)];
        let matches = vec![Correspondence::new(0, 0), Correspondence::new(1, 1)];

        // default min_pixel_distance of 100 px filters the only pair
        let result = compute_ttc_camera(&prev, &curr, &matches, 10.0, &VisionTtcConfig::default());
        assert_eq!(
            result,
            Err(FusionError::InsufficientData {
                required: 1,
                available: 0
            })
        );

        let empty = compute_ttc_camera(&prev, &curr, &[], 10.0, &permissive());
        assert!(matches!(empty, Err(FusionError::InsufficientData { .. })));
    }

    #[test]
    fn test_coincident_previous_keypoints_are_skipped() {
        let prev = vec![Keypoint::new(50.0, 50.0), Keypoint::new(50.0, 50.0)];
        let curr = vec![Keypoint::new(50.0, 50.0), Keypoint::new(60.0, 50.0)];
        let matches = vec![Correspondence::new(0, 0), Correspondence::new(1, 1)];

        let ratios = distance_ratios(&prev, &curr, &matches, &permissive()).unwrap();
        assert!(ratios.is_empty());
    }

    #[test]
    fn test_static_scene_is_degenerate() {
        let prev = grid((400.0, 200.0), 30.0, 1.0);
        let matches: Vec<_> = (0..prev.len()).map(|i| Correspondence::new(i, i)).collect();

        assert_eq!(
            compute_ttc_camera(&prev, &prev, &matches, 10.0, &permissive()),
            Err(FusionError::DegenerateGeometry(Degeneracy::NoRelativeMotion))
        );
    }

    #[test]
    fn test_out_of_range_correspondence() {
        let prev = vec![Keypoint::new(0.0, 0.0)];
        let curr = vec![Keypoint::new(0.0, 0.0)];
        let matches = vec![Correspondence::new(0, 0), Correspondence::new(4, 0)];

        let err = distance_ratios(&prev, &curr, &matches, &permissive()).unwrap_err();
        assert_eq!(
            err,
            FusionError::CorrespondenceOutOfRange {
                index: 1,
                keypoint: 4,
                side: FrameSide::Previous,
                len: 1
            }
        );
    }
}

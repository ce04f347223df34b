//! Tunable parameters for association and TTC estimation.
//!
//! Every field has a default, so a YAML file only needs the values it
//! overrides:
//!
//! ```yaml
//! frame_rate: 10.0
//! shrink_factor: 0.1
//! range:
//!   min_points: 8
//! crop:
//!   max_x: 25.0
//! ```

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::FusionError;
use crate::frame::RangePoint;

/// Top-level configuration for a [`crate::tracking::FusionTracker`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    /// Frames per second of the synchronized sensor stream.
    pub frame_rate: f64,
    /// Fraction by which regions shrink before range-point containment tests.
    pub shrink_factor: f64,
    pub range: RangeTtcConfig,
    pub vision: VisionTtcConfig,
    pub keypoints: KeypointFilterConfig,
    /// Optional box restricting range points before association.
    pub crop: Option<RangeCrop>,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            frame_rate: 10.0,
            shrink_factor: 0.10,
            range: RangeTtcConfig::default(),
            vision: VisionTtcConfig::default(),
            keypoints: KeypointFilterConfig::default(),
            crop: None,
        }
    }
}

impl FusionConfig {
    /// Load and validate a YAML configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: FusionConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every parameter is inside its admissible range.
    pub fn validate(&self) -> Result<(), FusionError> {
        if !(self.frame_rate.is_finite() && self.frame_rate > 0.0) {
            return Err(FusionError::InvalidConfig(format!(
                "frame_rate must be positive, got {}",
                self.frame_rate
            )));
        }
        if !(0.0..1.0).contains(&self.shrink_factor) {
            return Err(FusionError::InvalidConfig(format!(
                "shrink_factor must be in [0, 1), got {}",
                self.shrink_factor
            )));
        }
        self.range.validate()?;
        self.vision.validate()?;
        if let Some(ratio) = self.keypoints.max_displacement_ratio {
            if !(ratio.is_finite() && ratio > 0.0) {
                return Err(FusionError::InvalidConfig(format!(
                    "keypoints.max_displacement_ratio must be positive, got {ratio}"
                )));
            }
        }
        Ok(())
    }
}

/// Largest accepted `range.rank_floor`; no region owns this many points.
pub const MAX_RANK_FLOOR: usize = 100_000;

/// Robust closest-distance selection for the range estimator.
///
/// The robust distance of a point set is its sorted forward coordinate at
/// rank `max(rank_floor, round(closest_percentile * (n - 1)))`. The defaults
/// select the 6th-closest point and require at least six points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RangeTtcConfig {
    pub closest_percentile: f64,
    pub rank_floor: usize,
    pub min_points: usize,
}

impl Default for RangeTtcConfig {
    fn default() -> Self {
        Self {
            closest_percentile: 0.0,
            rank_floor: 5,
            min_points: 6,
        }
    }
}

impl RangeTtcConfig {
    pub fn validate(&self) -> Result<(), FusionError> {
        if !(0.0..=1.0).contains(&self.closest_percentile) {
            return Err(FusionError::InvalidConfig(format!(
                "range.closest_percentile must be in [0, 1], got {}",
                self.closest_percentile
            )));
        }
        if self.rank_floor > MAX_RANK_FLOOR {
            return Err(FusionError::InvalidConfig(format!(
                "range.rank_floor must be at most {MAX_RANK_FLOOR}, got {}",
                self.rank_floor
            )));
        }
        if self.min_points == 0 {
            return Err(FusionError::InvalidConfig(
                "range.min_points must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Pair filtering for the vision estimator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionTtcConfig {
    /// Minimum current-frame distance (px) for a keypoint pair to count.
    pub min_pixel_distance: f64,
    /// Previous-frame distances at or below this are skipped.
    pub min_prev_distance: f64,
}

impl Default for VisionTtcConfig {
    fn default() -> Self {
        Self {
            min_pixel_distance: 100.0,
            min_prev_distance: f64::EPSILON,
        }
    }
}

impl VisionTtcConfig {
    pub fn validate(&self) -> Result<(), FusionError> {
        if !(self.min_pixel_distance >= 0.0) || !(self.min_prev_distance >= 0.0) {
            return Err(FusionError::InvalidConfig(
                "vision distance thresholds must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// Optional outlier rejection applied after keypoint association.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeypointFilterConfig {
    /// Drop correspondences displaced more than this multiple of the region's
    /// mean displacement. `None` keeps every contained correspondence.
    pub max_displacement_ratio: Option<f64>,
}

/// Sensor-frame box that range points must fall in to be considered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RangeCrop {
    pub min_x: f64,
    pub max_x: f64,
    /// Bound on `|y|`.
    pub max_y: f64,
    pub min_z: f64,
    pub max_z: f64,
    /// Applied only to points that carry a reflectance.
    pub min_reflectance: f64,
}

impl Default for RangeCrop {
    /// Ego lane in front of the vehicle, road surface excluded.
    fn default() -> Self {
        Self {
            min_x: 2.0,
            max_x: 20.0,
            max_y: 2.0,
            min_z: -1.5,
            max_z: -0.9,
            min_reflectance: 0.1,
        }
    }
}

impl RangeCrop {
    #[inline]
    pub fn contains(&self, p: &RangePoint) -> bool {
        p.x >= self.min_x
            && p.x <= self.max_x
            && p.y.abs() <= self.max_y
            && p.z >= self.min_z
            && p.z <= self.max_z
            && p.reflectance.is_none_or(|r| r >= self.min_reflectance)
    }
}

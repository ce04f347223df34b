//! Core value types consumed from the sensing and matching collaborators.

use nalgebra::{Point2, Point3};
use serde::{Deserialize, Serialize};

/// Identifier of a detected region, valid within a single step.
///
/// Ordered so that vote ties can be broken deterministically toward the
/// lower id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BoxId(pub u32);

impl std::fmt::Display for BoxId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "B{}", self.0)
    }
}

/// A single return of the ranging sensor, in sensor/vehicle coordinates
/// (x forward, y left, z up).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangePoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Reflectance, when the sensor reports one.
    pub reflectance: Option<f64>,
}

impl RangePoint {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            x,
            y,
            z,
            reflectance: None,
        }
    }

    pub fn with_reflectance(x: f64, y: f64, z: f64, reflectance: f64) -> Self {
        Self {
            x,
            y,
            z,
            reflectance: Some(reflectance),
        }
    }

    #[inline]
    pub fn position(&self) -> Point3<f64> {
        Point3::new(self.x, self.y, self.z)
    }
}

/// A tracked visual feature location in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keypoint {
    pub pt: Point2<f64>,
}

impl Keypoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            pt: Point2::new(x, y),
        }
    }
}

/// The same physical feature seen in two frames: an index into the previous
/// frame's keypoints and an index into the current frame's keypoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Correspondence {
    pub prev_idx: usize,
    pub curr_idx: usize,
}

impl Correspondence {
    pub fn new(prev_idx: usize, curr_idx: usize) -> Self {
        Self { prev_idx, curr_idx }
    }
}

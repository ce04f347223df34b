//! Range-sensor to image-plane projection.
//!
//! A point `X = [x, y, z, 1]ᵀ` in sensor coordinates maps to the homogeneous
//! image vector
//!
//! ```text
//! [u, v, w]ᵀ = P_rect · R_rect · RT · X
//! ```
//!
//! and to the pixel `(u / w, v / w)`. `RT` is the sensor-to-camera extrinsic
//! transform, `R_rect` the rectifying rotation (padded to 4x4) and `P_rect` the
//! 3x4 projection of the rectified camera.

use nalgebra::{Matrix3x4, Matrix4, Point2, Point3, Vector4};

use crate::error::{Degeneracy, FusionError};

/// Depth below which a projection is treated as lying on the image plane.
const MIN_PROJECTED_DEPTH: f64 = 1e-9;

/// Fixed calibration supplied by the calibration collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct Calibration {
    /// Intrinsic projection of the rectified camera.
    pub p_rect: Matrix3x4<f64>,
    /// Rectifying rotation, padded to homogeneous 4x4.
    pub r_rect: Matrix4<f64>,
    /// Extrinsic rotation + translation, sensor to camera.
    pub rt: Matrix4<f64>,
}

impl Calibration {
    pub fn new(p_rect: Matrix3x4<f64>, r_rect: Matrix4<f64>, rt: Matrix4<f64>) -> Self {
        Self { p_rect, r_rect, rt }
    }
}

/// Immutable projector built once per sequence and shared by reference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projector {
    /// `P_rect · R_rect · RT`, folded once.
    combined: Matrix3x4<f64>,
}

impl Projector {
    pub fn new(calibration: &Calibration) -> Self {
        Self {
            combined: calibration.p_rect * calibration.r_rect * calibration.rt,
        }
    }

    /// Project a sensor-frame point into pixel coordinates.
    ///
    /// Fails with [`Degeneracy::NonPositiveDepth`] when the homogeneous depth
    /// `w` is not strictly positive; such points lie behind the camera and
    /// have no meaningful pixel.
    pub fn project(&self, point: &Point3<f64>) -> Result<Point2<f64>, FusionError> {
        let x = Vector4::new(point.x, point.y, point.z, 1.0);
        let y = self.combined * x;
        let w = y[2];
        if !(w > MIN_PROJECTED_DEPTH) {
            return Err(FusionError::DegenerateGeometry(Degeneracy::NonPositiveDepth));
        }
        Ok(Point2::new(y[0] / w, y[1] / w))
    }
}

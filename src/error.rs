//! Error taxonomy for the fusion core.
//!
//! Association and estimation return [`FusionError`] for conditions the caller
//! must see: too little data for a robust statistic, geometry that makes the
//! TTC undefined, and correspondences that reference keypoints which do not
//! exist. Ambiguous range points and unmatched regions are not errors; they are
//! reported as absent results.

use std::fmt;

use thiserror::Error;

/// Which frame of the previous/current pair a keypoint index refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameSide {
    Previous,
    Current,
}

impl fmt::Display for FrameSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameSide::Previous => write!(f, "previous"),
            FrameSide::Current => write!(f, "current"),
        }
    }
}

/// Geometric situations in which a TTC cannot be expressed as a finite number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Degeneracy {
    /// Robust distances are equal, or the median distance ratio is 1.
    NoRelativeMotion,
    /// A point projects onto or behind the image plane.
    NonPositiveDepth,
    /// Frame rate is zero, negative or not finite.
    InvalidFrameRate,
}

impl fmt::Display for Degeneracy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Degeneracy::NoRelativeMotion => write!(f, "no relative motion, TTC is infinite"),
            Degeneracy::NonPositiveDepth => write!(f, "non-positive projected depth"),
            Degeneracy::InvalidFrameRate => write!(f, "frame rate must be positive and finite"),
        }
    }
}

/// Errors produced by the association and TTC estimation core.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FusionError {
    /// Not enough owned points or surviving ratios for a robust statistic.
    #[error("insufficient data: need at least {required} samples, got {available}")]
    InsufficientData { required: usize, available: usize },

    /// The estimate is undefined or infinite.
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(Degeneracy),

    /// A correspondence references a keypoint that does not exist.
    #[error(
        "correspondence {index} references {side} keypoint {keypoint}, but the frame has {len}"
    )]
    CorrespondenceOutOfRange {
        index: usize,
        keypoint: usize,
        side: FrameSide,
        len: usize,
    },

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl FusionError {
    /// True for the errors that mean "TTC undefined" rather than bad input.
    pub fn is_undefined_estimate(&self) -> bool {
        matches!(
            self,
            FusionError::InsufficientData { .. } | FusionError::DegenerateGeometry(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = FusionError::InsufficientData {
            required: 6,
            available: 2,
        };
        assert_eq!(
            err.to_string(),
            "insufficient data: need at least 6 samples, got 2"
        );

        let err = FusionError::CorrespondenceOutOfRange {
            index: 3,
            keypoint: 40,
            side: FrameSide::Current,
            len: 12,
        };
        assert!(err.to_string().contains("current keypoint 40"));
    }

    #[test]
    fn test_undefined_estimate_classification() {
        assert!(
            FusionError::DegenerateGeometry(Degeneracy::NoRelativeMotion).is_undefined_estimate()
        );
        assert!(
            FusionError::InsufficientData {
                required: 1,
                available: 0
            }
            .is_undefined_estimate()
        );
        assert!(!FusionError::InvalidConfig("shrink".into()).is_undefined_estimate());
    }
}

//! Per-step data model: range points, keypoints, correspondences and the
//! detected regions that own them.
//!
//! All of it is ephemeral. A `FrameBundle` lives for one step as the current
//! frame and one more as the previous frame; only the `RegionIdentityMap`
//! produced between them is reported onward.

pub mod bundle;
pub mod region;
pub mod types;

pub use bundle::{FrameBundle, RegionIdentityMap, check_correspondences};
pub use region::DetectedRegion;
pub use types::{BoxId, Correspondence, Keypoint, RangePoint};

//! Associate sensor data with detected regions, and regions across frames.
//!
//! - `range_points`: range point → region, exclusive, via projection
//! - `keypoints`: correspondence → region, by current-frame keypoint
//! - `region_matching`: previous region → current region, by majority vote

pub mod keypoints;
pub mod range_points;
pub mod region_matching;

pub use keypoints::{cluster_keypoint_matches, filter_by_displacement};
pub use range_points::{
    AssociationStats, Enclosure, cluster_range_points, crop_range_points, enclosing_region,
};
pub use region_matching::{
    VoteTable, best_matches_from_votes, count_region_votes, match_bounding_boxes,
};

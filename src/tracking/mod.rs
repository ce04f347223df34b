//! Step-by-step fusion tracking: association, matching and TTC per object.

pub mod result;
pub mod tracker;

pub use result::{RegionSummary, StepResult, TimingStats, TrackedObject};
pub use tracker::FusionTracker;

//! Top-level driver: a loader thread feeding the tracker.

pub mod fusion_system;

pub use fusion_system::FusionSystem;

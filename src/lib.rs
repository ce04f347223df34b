pub mod association;
pub mod config;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod io;
pub mod system;
pub mod tracking;
pub mod ttc;

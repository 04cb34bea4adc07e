//! # Navigation library.
//!
//! This library allows other crates in the workspace (and the benchmarks) to access items
//! defined inside the navigation crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Data store - everything the executable keeps between cycles
pub mod data_store;

/// Frames - vision and planner output for one camera image
pub mod frame;

/// Field geometry - points, distances and polygon tests
pub mod geom;

/// Mechanisms client - sends commands to the actuator controller and reads its status
pub mod mech_client;

/// Navigation control module - drives the vehicle along the waypoint queue
pub mod nav_ctrl;

/// Executable parameters
pub mod params;

/// Vehicle pose and path intent
pub mod pose;

/// Projector - corrects raised objects for camera parallax
pub mod proj;

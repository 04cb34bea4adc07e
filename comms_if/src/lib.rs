//! # Communications interface crate.
//!
//! Provides all common communications interfaces for the software.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Command and status definitions for equipment (like the actuator controller)
pub mod eqpt;

/// Network module
pub mod net;

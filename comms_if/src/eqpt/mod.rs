//! # Equipment Interface
//!
//! This module defines the interface structures which are sent to and received from the
//! equipment servers.

/// Actuator controller commands and status notifications
pub mod act;

pub use act::{ActCmd, ActStatus, ActParseError};

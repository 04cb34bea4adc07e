//! # Navigation control module
//!
//! Navigation control drives the vehicle along the waypoint queue given by the path planner. It
//! is ticked once per camera frame and on each tick decides which commands (if any) to send to
//! the actuator controller.
//!
//! Each tick runs through the following in priority order, the first which applies ends the
//! tick:
//!
//!  1. Timed pause, nothing is sent while paused.
//!  2. One-shot reverse recovery after an outer collector stall or stopping near a wall.
//!  3. Backing away from the goal after a delivery.
//!  4. Empty queue, stop the vehicle (and finish the run if the goal has been withdrawn from).
//!  5. Normal motion towards the head of the queue: turn or drive, collect, react to stalls, and
//!     advance the queue once the waypoint is reached.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod collect;
mod params;
mod pathing;
mod state;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

pub use params::*;
pub use state::*;

use comms_if::eqpt::{ActCmd, ActStatus};

use crate::mech_client::MechClientError;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A link to the actuator controller.
pub trait ActLink {
    /// Send a command. Commands are not acknowledged.
    fn send(&mut self, cmd: ActCmd) -> Result<(), MechClientError>;

    /// Take the next status notification, if any, without blocking.
    fn poll_status(&mut self) -> Result<Option<ActStatus>, MechClientError>;
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Possible errors that can occur during NavCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum NavCtrlError {
    #[error("Invalid parameter {0}: {1}")]
    InvalidParam(&'static str, String),
}

//! # Vehicle pose
//!
//! The pose of the vehicle as perceived by the vision system, plus the planner's intent for the
//! current path.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use util::maths::wrap_360_deg;

use crate::geom::{centroid, Point};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The pose of the vehicle in the field frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehiclePose {
    /// Centre of the vehicle footprint
    pub center: Point,

    /// The point at the nose of the vehicle
    pub front: Point,

    /// The midpoint of the rear edge of the vehicle
    pub back: Point,

    /// Absolute heading of the back to front axis.
    ///
    /// Units: degrees in [0, 360), measured from the field's +X axis towards +Y.
    pub heading_deg: f64,

    /// The vehicle's footprint polygon, at least 3 points
    pub footprint: Vec<Point>,
}

/// Flags from the path planner describing the current path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathIntent {
    /// The current path ends at the delivery goal
    #[serde(default)]
    pub towards_goal: bool,

    /// The vehicle should reverse away from the end of the current path
    #[serde(default)]
    pub reverse: bool,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl VehiclePose {
    /// Build the pose from the (projected) corners of the vehicle's triangular marker.
    ///
    /// The first corner is the apex at the nose of the vehicle, the other two form the rear edge.
    /// Returns `None` if fewer than 3 corners are given.
    pub fn from_marker(corners: &[Point]) -> Option<Self> {
        if corners.len() < 3 {
            return None;
        }

        let front = corners[0];
        let back = nalgebra::center(&corners[1], &corners[2]);
        let center = centroid(corners)?;

        Some(Self {
            center,
            front,
            back,
            heading_deg: bearing_deg(&back, &front),
            footprint: corners.to_vec(),
        })
    }

    /// Bearing of `target` as seen from `reference`, in the same frame as `heading_deg`.
    pub fn bearing_to(&self, target: &Point, reference: &Point) -> f64 {
        bearing_deg(reference, target)
    }
}

impl PathIntent {
    /// Record that the vehicle has delivered to the goal at the end of this path.
    pub fn complete_goal_leg(&mut self) {
        self.towards_goal = false;
    }
}

/// Direction of the vector `from -> to` in degrees, in [0, 360).
fn bearing_deg(from: &Point, to: &Point) -> f64 {
    let d = to - from;
    wrap_360_deg(d.y.atan2(d.x).to_degrees())
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

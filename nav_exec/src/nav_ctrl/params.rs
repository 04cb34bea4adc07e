//! Parameters structure for NavCtrl

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters for navigation control.
///
/// Speeds are in the actuator controller's own units, distances in field pixels and angles in
/// degrees. Any value missing from the parameter file takes its default.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NavCtrlParams {
    // ---- SPEEDS ----

    /// Turn speed when far from the target
    pub turn_speed: i32,

    /// Turn speed when close to the target, and for goal heading alignment
    pub turn_slow_speed: i32,

    /// Drive speed when close to the target
    pub slow_speed: i32,

    /// Drive speed when far from the target
    pub move_speed: i32,

    /// Drive speed (magnitude) when reversing
    pub reverse_speed: i32,

    /// Outer collector speed
    pub collect_outer_speed: i32,

    /// Inner collector speed
    pub collect_inner_speed: i32,

    // ---- TOLERANCES ----

    /// Heading tolerance when far from the target
    pub degree_offset: f64,

    /// Heading tolerance when close to the target, and for goal heading alignment
    pub slow_degree_offset: f64,

    /// Distance below which the slow speeds and tolerances are used
    pub slow_threshold: f64,

    /// Width of the band along each wall in which the vehicle is "at a wall"
    pub wall_safe_distance: f64,

    /// Side of the square in each field corner in which the vehicle is "in a corner"
    pub corner_safe_distance: f64,

    /// Distance a target must be inside the footprint before it counts as reached
    pub inside_dist_offset: f64,

    /// As `inside_dist_offset` but used when at a wall
    pub inside_wall_dist_offset: f64,

    /// As `inside_dist_offset` but used when in a corner
    pub inside_corner_dist_offset: f64,

    // ---- GOAL ----

    /// Absolute heading the vehicle must face to deliver at the goal. Zero means 180 degrees,
    /// any other value is the heading itself, so 360 is used to face 0 degrees. This is not a
    /// two-way selector between 180 and 0.
    ///
    /// Units: degrees
    pub goal_heading_deg: f64,

    /// On a goal path with more than one waypoint left, waypoints at a (signed) distance at
    /// least this are skipped.
    pub goal_skip_distance: f64,

    // ---- FAILSAFES ----

    /// Any distance to the target at least this large restarts the stuck timer
    pub stuck_reset_distance: f64,

    /// Time without progress after which the current waypoint is skipped
    ///
    /// Units: seconds
    pub stuck_timeout_s: f64,

    // ---- TIMING ----

    /// Pause after starting the one-shot reverse recovery
    ///
    /// Units: seconds
    pub reverse_recovery_pause_s: f64,

    /// Pause after starting to back away from the goal
    ///
    /// Units: seconds
    pub withdraw_pause_s: f64,

    /// Pause after stopping at the end of a path near a wall or corner
    ///
    /// Units: seconds
    pub edge_stop_pause_s: f64,

    /// Pause while ejecting the load at the goal
    ///
    /// Units: seconds
    pub goal_eject_pause_s: f64,

    // ---- SIGNALS ----

    /// Beep pattern played when the last waypoint of a path is reached
    pub finish_beep_pattern: i32,
}

impl Default for NavCtrlParams {
    fn default() -> Self {
        Self {
            turn_speed: 200,
            turn_slow_speed: 120,
            slow_speed: 240,
            move_speed: 440,
            reverse_speed: 280,
            collect_outer_speed: 500,
            collect_inner_speed: 200,

            degree_offset: 7.0,
            slow_degree_offset: 3.0,
            slow_threshold: 40.0,
            wall_safe_distance: 30.0,
            corner_safe_distance: 30.0,
            inside_dist_offset: 0.5,
            inside_wall_dist_offset: -4.0,
            inside_corner_dist_offset: -5.0,

            goal_heading_deg: 0.0,
            goal_skip_distance: -10.0,

            stuck_reset_distance: 30.0,
            stuck_timeout_s: 10.0,

            reverse_recovery_pause_s: 1.2,
            withdraw_pause_s: 2.0,
            edge_stop_pause_s: 1.25,
            goal_eject_pause_s: 5.0,

            finish_beep_pattern: 4,
        }
    }
}

impl NavCtrlParams {
    /// The goal heading actually used, with the zero convention resolved. Non-zero values are
    /// returned unchanged.
    pub fn effective_goal_heading_deg(&self) -> f64 {
        if self.goal_heading_deg == 0.0 {
            180.0
        }
        else {
            self.goal_heading_deg
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_effective_goal_heading() {
        let mut p = NavCtrlParams::default();
        assert_eq!(p.effective_goal_heading_deg(), 180.0);

        p.goal_heading_deg = 90.0;
        assert_eq!(p.effective_goal_heading_deg(), 90.0);

        // Facing 0 degrees needs a full turn rather than zero
        p.goal_heading_deg = 360.0;
        assert_eq!(p.effective_goal_heading_deg(), 360.0);
    }
}

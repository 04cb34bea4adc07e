//! Waypoint arrival and queue advance

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, info, warn};

use comms_if::eqpt::ActCmd;
use util::maths::shortest_rotation_deg;

use super::{
    state::Tick,
    ActLink, CollectState, GoalState, NavCtrl, NavEvent, NavInput, NavMode, Recovery,
};
use crate::geom::{inside_rect, FieldDims, Point};

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl NavCtrl {
    /// Decide whether the current target has been reached and advance the queue if it has.
    pub(super) fn handle_pathing<L: ActLink + ?Sized>(
        &mut self,
        tick: &mut Tick<L>,
        input: &NavInput,
        dist: f64
    ) {
        let now = input.time_s;
        let front = &input.pose.front;

        // ---- ARRIVAL TOLERANCE ----

        // Near the edges the nose can't get right over the target, so accept it from further
        // out and back away afterwards.
        let mut inside_tolerance = self.params.inside_dist_offset;
        if self.near_corner(front, input.field) {
            inside_tolerance = self.params.inside_corner_dist_offset;
            self.edge_reverse = true;
        }
        else if self.near_wall(front, input.field) {
            inside_tolerance = self.params.inside_wall_dist_offset;
            self.edge_reverse = true;
        }

        // ---- STUCK FAILSAFE ----

        let mut force_skip = false;
        let stuck_since = *self.stuck_since_s.get_or_insert(now);

        if dist.abs() >= self.params.stuck_reset_distance {
            self.stuck_since_s = Some(now);
        }
        else if now - stuck_since >= self.params.stuck_timeout_s {
            warn!("No progress for {:.1} s, skipping target", now - stuck_since);
            force_skip = true;
        }

        // ---- GOAL HEADING ----

        let towards_goal = input.intent.towards_goal;

        if towards_goal && self.targets.len() <= 1 {
            let diff = shortest_rotation_deg(
                input.pose.heading_deg,
                self.params.effective_goal_heading_deg()
            );

            if diff.abs() > self.params.slow_degree_offset {
                debug!("Aligning with the goal heading, {:.0} deg to go", diff);
                tick.send(ActCmd::Turn {
                    angle_deg: diff as i32,
                    speed: self.params.turn_slow_speed,
                });
                tick.out.mode = NavMode::GoalAlign;
                return;
            }
        }

        // Intermediate goal path waypoints only need to be passed close by
        if towards_goal && self.targets.len() > 1 && dist >= self.params.goal_skip_distance {
            force_skip = true;
        }

        // ---- ADVANCE ----

        if dist <= inside_tolerance && !force_skip {
            return;
        }

        // Stalls can empty the queue earlier in the tick
        let reached = match self.targets.pop_front() {
            Some(t) => t,
            None => return,
        };

        let remaining = self.targets.len();
        info!(
            "Reached target ({:.1}, {:.1}), {} remaining",
            reached.x, reached.y, remaining
        );
        tick.out.events.push(NavEvent::WaypointReached { remaining });

        if remaining == 0 {
            tick.send(ActCmd::Beep { pattern: self.params.finish_beep_pattern });
        }

        // Keep rolling so the vehicle doesn't start turning on the spot
        tick.send(ActCmd::Move { speed: self.params.slow_speed });

        if remaining == 0 && self.edge_reverse {
            debug!("Path ended near the field edge, stopping before reversing");
            tick.send(ActCmd::STOP);
            self.pause(now, self.params.edge_stop_pause_s);
            self.edge_reverse = false;
            self.recovery = Recovery::ReverseArmed;
        }

        self.edge_reverse = input.intent.reverse;

        if remaining == 0 && towards_goal {
            info!("Goal reached, ejecting load");

            tick.send(ActCmd::STOP);
            tick.send(ActCmd::Collect {
                inner_speed: -self.params.collect_inner_speed,
                outer_speed: -self.params.collect_outer_speed,
            });

            if self.collect == CollectState::InnerStalled {
                self.collect = CollectState::Idle;
            }

            tick.out.events.push(NavEvent::GoalLegComplete);
            self.goal = GoalState::Delivered;
            self.pause(now, self.params.goal_eject_pause_s);
        }
    }

    /// True if the point is in one of the four corner squares of the field.
    pub(super) fn near_corner(&self, point: &Point, field: FieldDims) -> bool {
        let d = self.params.corner_safe_distance;
        let (w, h) = (field.width, field.height);

        inside_rect(point, 0.0, 0.0, d, d)
            || inside_rect(point, w - d, 0.0, w, d)
            || inside_rect(point, 0.0, h - d, d, h)
            || inside_rect(point, w - d, h - d, w, h)
    }

    /// True if the point is not well inside the field, away from all walls.
    pub(super) fn near_wall(&self, point: &Point, field: FieldDims) -> bool {
        let d = self.params.wall_safe_distance;

        !inside_rect(point, d, d, field.width - d, field.height - d)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

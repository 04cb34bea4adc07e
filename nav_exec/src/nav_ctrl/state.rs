//! Implementations for the NavCtrl state structure

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use std::collections::VecDeque;
use log::{debug, info, trace, warn};
use serde::Serialize;

// Internal
use comms_if::eqpt::{ActCmd, ActStatus};
use util::maths::shortest_rotation_deg;

use super::{ActLink, NavCtrlError, NavCtrlParams};
use crate::{
    geom::{euclid, signed_poly_dist, FieldDims, Point},
    pose::{PathIntent, VehiclePose},
};

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Navigation control module state
pub struct NavCtrl {
    pub(super) params: NavCtrlParams,

    /// Waypoints still to visit, the head is the current target
    pub(super) targets: VecDeque<Point>,

    pub(super) collect: CollectState,

    pub(super) goal: GoalState,

    pub(super) recovery: Recovery,

    /// Reverse away once the current path is finished, set when the path ends near a wall or
    /// corner or when the planner asks for it.
    pub(super) edge_reverse: bool,

    /// Nothing happens until this session time
    pub(super) pause_until_s: Option<f64>,

    /// Last time the vehicle was far from its target
    pub(super) stuck_since_s: Option<f64>,

    /// Set on the tick the run completes, cleared by the next stop
    done: bool,

    mode: NavMode,

    last_time_s: f64,
    last_distance: Option<f64>,
    last_rotation_deg: Option<f64>,
}

/// Input data to navigation control, a snapshot taken before the tick.
#[derive(Debug, Clone)]
pub struct NavInput {
    /// Current (projected) pose of the vehicle
    pub pose: VehiclePose,

    /// The planner's intent for the current path
    pub intent: PathIntent,

    /// Size of the field
    pub field: FieldDims,

    /// Current session time.
    ///
    /// Units: seconds
    pub time_s: f64,
}

/// Output of a single NavCtrl tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NavOutput {
    /// Commands sent on the link this tick, in order
    pub cmds: Vec<ActCmd>,

    /// Events for the owner of the controller
    pub events: Vec<NavEvent>,

    /// What the controller was doing this tick
    pub mode: NavMode,
}

/// Flat status record archived once per cycle.
#[derive(Debug, Clone, Serialize)]
pub struct NavCtrlStatus {
    pub time_s: f64,
    pub mode: NavMode,
    pub num_targets: usize,
    pub target_x: Option<f64>,
    pub target_y: Option<f64>,
    pub distance: Option<f64>,
    pub rotation_deg: Option<f64>,
    pub collect: CollectState,
    pub goal: GoalState,
    pub reverse_armed: bool,
    pub edge_reverse: bool,
    pub paused: bool,
    pub done: bool,
}

/// Internal part of a tick, sends commands and records them in the output.
pub(super) struct Tick<'a, L: ?Sized> {
    link: &'a mut L,
    pub(super) out: NavOutput,
}

// ------------------------------------------------------------------------------------------------
// ENUMERATIONS
// ------------------------------------------------------------------------------------------------

/// State of the collection mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CollectState {
    /// Not running, will be started by the next motion tick
    Idle,

    /// Running at full speed
    Collecting,

    /// The inner motor stalled and was stopped, only the outer motor runs
    InnerStalled,
}

/// Progress through the goal delivery sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GoalState {
    /// No delivery pending
    Seeking,

    /// The load was just ejected at the goal, the vehicle must back away
    Delivered,

    /// The vehicle has backed away from the goal
    Withdrawn,
}

/// One-shot reverse recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Recovery {
    Idle,

    /// Reverse on the next unpaused tick
    ReverseArmed,
}

/// What the controller did on a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NavMode {
    /// No waypoints, the vehicle is stopped
    Idle,

    /// Waiting for a timed manoeuvre to finish
    Paused,

    /// Backing up after a stall or after stopping near the field edge
    ReverseRecovery,

    /// Backing away from the goal after a delivery
    GoalWithdrawal,

    /// Turning on the spot towards the target
    Turning,

    /// Driving towards the target
    Driving,

    /// Turning to face the goal heading before finishing the approach
    GoalAlign,

    /// The run has completed
    Finished,
}

/// Events reported by a tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NavEvent {
    /// A waypoint was reached (or skipped) and removed from the queue
    WaypointReached { remaining: usize },

    /// The collector reported a stall
    CollectorStalled(ActStatus),

    /// The load has been delivered at the end of a goal path. The owner must clear the
    /// `towards_goal` flag of its `PathIntent`, see `PathIntent::complete_goal_leg`.
    GoalLegComplete,

    /// The goal has been delivered to and withdrawn from, and there is nothing left to do
    RunComplete,
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl Default for NavMode {
    fn default() -> Self {
        NavMode::Idle
    }
}

impl NavCtrl {
    /// Create a new instance of the controller with the given parameters.
    pub fn new(params: NavCtrlParams) -> Result<Self, NavCtrlError> {
        validate_params(&params)?;

        Ok(Self {
            params,
            targets: VecDeque::new(),
            collect: CollectState::Idle,
            goal: GoalState::Seeking,
            recovery: Recovery::Idle,
            edge_reverse: false,
            pause_until_s: None,
            stuck_since_s: None,
            done: false,
            mode: NavMode::Idle,
            last_time_s: 0.0,
            last_distance: None,
            last_rotation_deg: None,
        })
    }

    pub fn params(&self) -> &NavCtrlParams {
        &self.params
    }

    /// Replace the waypoint queue.
    pub fn set_targets<I: IntoIterator<Item = Point>>(&mut self, targets: I) {
        self.targets = targets.into_iter().collect();
        debug!("NavCtrl has {} new targets", self.targets.len());
    }

    /// The waypoints still to visit, current target first.
    pub fn targets(&self) -> impl Iterator<Item = &Point> {
        self.targets.iter()
    }

    pub fn num_targets(&self) -> usize {
        self.targets.len()
    }

    /// True from the tick the run completes until the next stop.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// The mode of the last tick.
    pub fn mode(&self) -> NavMode {
        self.mode
    }

    /// Snapshot of the controller state for archiving.
    pub fn status(&self) -> NavCtrlStatus {
        let target = self.targets.front();

        NavCtrlStatus {
            time_s: self.last_time_s,
            mode: self.mode,
            num_targets: self.targets.len(),
            target_x: target.map(|t| t.x),
            target_y: target.map(|t| t.y),
            distance: self.last_distance,
            rotation_deg: self.last_rotation_deg,
            collect: self.collect,
            goal: self.goal,
            reverse_armed: self.recovery == Recovery::ReverseArmed,
            edge_reverse: self.edge_reverse,
            paused: self.is_paused(self.last_time_s),
            done: self.done,
        }
    }

    /// Perform one tick of navigation control.
    ///
    /// Commands are sent on the link as they are decided and also returned in the output. Link
    /// errors are logged and otherwise ignored.
    pub fn step<L: ActLink + ?Sized>(&mut self, input: &NavInput, link: &mut L) -> NavOutput {
        let mut tick = Tick::new(link);

        self.last_time_s = input.time_s;
        self.last_distance = None;
        self.last_rotation_deg = None;

        self.tick(input, &mut tick);

        self.mode = tick.out.mode;

        trace!("NavCtrl tick {:.3} s: {:?}", input.time_s, tick.out);

        tick.out
    }

    /// Stop the vehicle and collector and reset the controller's state.
    ///
    /// The waypoint queue and the stuck timer are left untouched.
    pub fn stop<L: ActLink + ?Sized>(&mut self, link: &mut L) -> NavOutput {
        let mut tick = Tick::new(link);

        self.stop_inner(&mut tick);
        self.mode = NavMode::Idle;

        tick.out
    }

    pub(super) fn is_paused(&self, now_s: f64) -> bool {
        match self.pause_until_s {
            Some(t) => t > now_s,
            None => false,
        }
    }

    pub(super) fn pause(&mut self, now_s: f64, duration_s: f64) {
        self.pause_until_s = Some(now_s + duration_s);
    }

    fn tick<L: ActLink + ?Sized>(&mut self, input: &NavInput, tick: &mut Tick<L>) {
        let now = input.time_s;

        // ---- TIMED PAUSE ----

        if self.is_paused(now) {
            tick.out.mode = NavMode::Paused;
            return;
        }

        // ---- REVERSE RECOVERY ----

        if self.recovery == Recovery::ReverseArmed {
            self.recovery = Recovery::Idle;

            debug!("Reverse recovery");
            tick.send(ActCmd::Move { speed: -self.params.reverse_speed });
            self.pause(now, self.params.reverse_recovery_pause_s);
            tick.send(self.collect_cmd());

            tick.out.mode = NavMode::ReverseRecovery;
            return;
        }

        // ---- GOAL WITHDRAWAL ----

        if self.goal == GoalState::Delivered {
            info!("Withdrawing from the goal");
            tick.send(ActCmd::Move { speed: -self.params.reverse_speed });
            tick.send(self.collect_cmd());
            self.pause(now, self.params.withdraw_pause_s);

            self.goal = GoalState::Withdrawn;

            tick.out.mode = NavMode::GoalWithdrawal;
            return;
        }

        // ---- EMPTY QUEUE ----

        let target = match self.targets.front() {
            Some(t) => *t,
            None => {
                let withdrawn = self.goal == GoalState::Withdrawn;

                self.stop_inner(tick);

                if withdrawn {
                    info!("Run complete");
                    self.done = true;
                    tick.out.events.push(NavEvent::RunComplete);
                    tick.out.mode = NavMode::Finished;
                }
                else {
                    tick.out.mode = NavMode::Idle;
                }
                return;
            }
        };

        // ---- MOTION ----

        let pose = &input.pose;

        let bearing = pose.bearing_to(&target, &pose.back);
        let rotation = shortest_rotation_deg(pose.heading_deg, bearing);

        // On the final goal approach the distance is the (negated) distance to the goal rather
        // than how far the target is inside the footprint.
        let dist = if !(input.intent.towards_goal && self.targets.len() <= 1) {
            signed_poly_dist(&pose.footprint, &target)
        }
        else {
            -euclid(&pose.center, &target).round()
        };

        self.last_distance = Some(dist);
        self.last_rotation_deg = Some(rotation);

        debug!(
            "Target ({:.1}, {:.1}): distance {:.2}, rotation {:.0} deg",
            target.x, target.y, dist, rotation
        );

        self.handle_movement(tick, dist.abs(), rotation);
        self.handle_collecting(tick);
        self.handle_pathing(tick, input, dist);
    }

    fn handle_movement<L: ActLink + ?Sized>(
        &mut self,
        tick: &mut Tick<L>,
        abs_dist: f64,
        rotation: f64
    ) {
        let p = &self.params;
        let slow = abs_dist < p.slow_threshold;

        let tolerance = if slow { p.slow_degree_offset } else { p.degree_offset };

        if rotation.abs() > tolerance {
            let speed = if slow { p.turn_slow_speed } else { p.turn_speed };
            tick.send(ActCmd::Turn { angle_deg: rotation as i32, speed });
            tick.out.mode = NavMode::Turning;
        }
        else {
            let speed = if slow { p.slow_speed } else { p.move_speed };
            tick.send(ActCmd::Move { speed });
            tick.out.mode = NavMode::Driving;
        }
    }

    pub(super) fn stop_inner<L: ActLink + ?Sized>(&mut self, tick: &mut Tick<L>) {
        tick.send(ActCmd::STOP);
        tick.send(ActCmd::Collect { inner_speed: 0, outer_speed: 0 });

        self.pause_until_s = None;
        self.done = false;
        self.collect = CollectState::Idle;
        self.recovery = Recovery::Idle;
        self.edge_reverse = false;
        self.goal = GoalState::Seeking;
    }

    /// Full speed collection command.
    pub(super) fn collect_cmd(&self) -> ActCmd {
        ActCmd::Collect {
            inner_speed: self.params.collect_inner_speed,
            outer_speed: self.params.collect_outer_speed,
        }
    }
}

impl<'a, L: ActLink + ?Sized> Tick<'a, L> {
    fn new(link: &'a mut L) -> Self {
        Self {
            link,
            out: NavOutput::default(),
        }
    }

    pub(super) fn send(&mut self, cmd: ActCmd) {
        trace!("NavCtrl -> {}", cmd);

        if let Err(e) = self.link.send(cmd) {
            warn!("Could not send \"{}\" to the actuator controller: {}", cmd, e);
        }

        self.out.cmds.push(cmd);
    }

    pub(super) fn poll_status(&mut self) -> Option<ActStatus> {
        match self.link.poll_status() {
            Ok(s) => s,
            Err(e) => {
                warn!("Could not read actuator controller status: {}", e);
                None
            }
        }
    }
}

fn validate_params(p: &NavCtrlParams) -> Result<(), NavCtrlError> {
    let durations = [
        ("stuck_timeout_s", p.stuck_timeout_s),
        ("reverse_recovery_pause_s", p.reverse_recovery_pause_s),
        ("withdraw_pause_s", p.withdraw_pause_s),
        ("edge_stop_pause_s", p.edge_stop_pause_s),
        ("goal_eject_pause_s", p.goal_eject_pause_s),
    ];

    for (name, value) in durations.iter() {
        if !value.is_finite() || *value < 0.0 {
            return Err(NavCtrlError::InvalidParam(
                *name,
                format!("must be a non-negative number of seconds, found {}", value)
            ));
        }
    }

    let finite = [
        ("degree_offset", p.degree_offset),
        ("slow_degree_offset", p.slow_degree_offset),
        ("slow_threshold", p.slow_threshold),
        ("wall_safe_distance", p.wall_safe_distance),
        ("corner_safe_distance", p.corner_safe_distance),
        ("inside_dist_offset", p.inside_dist_offset),
        ("inside_wall_dist_offset", p.inside_wall_dist_offset),
        ("inside_corner_dist_offset", p.inside_corner_dist_offset),
        ("goal_heading_deg", p.goal_heading_deg),
        ("goal_skip_distance", p.goal_skip_distance),
        ("stuck_reset_distance", p.stuck_reset_distance),
    ];

    for (name, value) in finite.iter() {
        if !value.is_finite() {
            return Err(NavCtrlError::InvalidParam(*name, format!("must be finite, found {}", value)));
        }
    }

    Ok(())
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

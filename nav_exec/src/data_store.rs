//! # Data Store

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::warn;
use serde::Serialize;

use comms_if::eqpt::ActCmd;
use util::{
    archive::{ArchiveError, Archived, Archiver},
    session::Session,
};

use crate::{
    frame::Frame,
    geom::FieldDims,
    nav_ctrl::{NavCtrl, NavEvent, NavOutput},
    pose::{PathIntent, VehiclePose},
    proj::{ProjError, Projector},
};

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Global data store for the executable.
pub struct DataStore {
    // Cycle management
    /// Number of cycles already executed
    pub num_cycles: u64,

    /// Session time at the start of this cycle
    pub time_s: f64,

    /// Field the vehicle is driving in
    pub field: FieldDims,

    // Vision & planner
    /// Latest projected pose of the vehicle
    pub pose: Option<VehiclePose>,

    /// A frame with a usable pose arrived this cycle
    pub new_frame: bool,

    /// Path intent, owned here and updated by the planner and by NavCtrl's events
    pub intent: PathIntent,

    // NavCtrl
    pub nav_ctrl: NavCtrl,
    pub nav_ctrl_output: NavOutput,

    // Monitoring Counters
    /// Number of consecutive cycle overruns
    pub num_consec_cycle_overruns: u64,

    /// Number of frames which couldn't be used
    pub num_bad_frames: u64,

    /// Total number of commands sent
    pub num_cmds_sent: u64,

    /// Number of goal deliveries this run
    pub num_goal_deliveries: u64,

    /// NavCtrl has reported the run complete
    pub run_complete: bool,

    arch_nav_ctrl: Archiver,
}

/// Summary of the run, saved at the end of the session.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub num_cycles: u64,
    pub duration_s: f64,
    pub num_cmds_sent: u64,
    pub num_bad_frames: u64,
    pub num_goal_deliveries: u64,
    pub num_consec_cycle_overruns: u64,
    pub run_complete: bool,
    pub targets_remaining: usize,
    pub last_cmds: Vec<ActCmd>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl DataStore {
    pub fn new(nav_ctrl: NavCtrl, field: FieldDims) -> Self {
        Self {
            num_cycles: 0,
            time_s: 0.0,
            field,
            pose: None,
            new_frame: false,
            intent: PathIntent::default(),
            nav_ctrl,
            nav_ctrl_output: NavOutput::default(),
            num_consec_cycle_overruns: 0,
            num_bad_frames: 0,
            num_cmds_sent: 0,
            num_goal_deliveries: 0,
            run_complete: false,
            arch_nav_ctrl: Archiver::default(),
        }
    }

    /// Open the archives in the session's archive directory.
    pub fn init_archives(&mut self, session: &Session) -> Result<(), ArchiveError> {
        self.arch_nav_ctrl = Archiver::from_path(session, "nav_ctrl/status.csv")?;
        Ok(())
    }

    /// Perform actions required at the start of a cycle.
    pub fn cycle_start(&mut self, time_s: f64) {
        self.time_s = time_s;
        self.new_frame = false;
        self.nav_ctrl_output = NavOutput::default();
    }

    /// Apply a frame from the vision system and planner.
    ///
    /// The planner's targets and intent are applied before the pose, so that a bad pose doesn't
    /// lose them.
    pub fn apply_frame(&mut self, frame: Frame, projector: &Projector) -> Result<(), ProjError> {
        if let Some(targets) = frame.targets {
            self.nav_ctrl.set_targets(targets);
        }

        if let Some(intent) = frame.intent {
            self.intent = intent;
        }

        let corners = projector.project(&frame.vehicle_corners, self.field)?;
        self.pose = VehiclePose::from_marker(&corners);
        self.new_frame |= self.pose.is_some();

        Ok(())
    }

    /// Handle the events NavCtrl reported this cycle.
    pub fn handle_nav_events(&mut self) {
        self.num_cmds_sent += self.nav_ctrl_output.cmds.len() as u64;

        for event in self.nav_ctrl_output.events.iter() {
            match event {
                NavEvent::GoalLegComplete => {
                    self.intent.complete_goal_leg();
                    self.num_goal_deliveries += 1;
                },
                NavEvent::RunComplete => self.run_complete = true,
                _ => ()
            }
        }
    }

    pub fn run_summary(&self, duration_s: f64) -> RunSummary {
        RunSummary {
            num_cycles: self.num_cycles,
            duration_s,
            num_cmds_sent: self.num_cmds_sent,
            num_bad_frames: self.num_bad_frames,
            num_goal_deliveries: self.num_goal_deliveries,
            num_consec_cycle_overruns: self.num_consec_cycle_overruns,
            run_complete: self.run_complete,
            targets_remaining: self.nav_ctrl.num_targets(),
            last_cmds: self.nav_ctrl_output.cmds.clone(),
        }
    }

    /// Perform actions required at the end of a cycle.
    pub fn cycle_end(&mut self) {
        if let Err(e) = self.write() {
            warn!("Could not write the NavCtrl archive: {}", e);
        }

        self.num_cycles += 1;
    }
}

impl Archived for DataStore {
    fn write(&mut self) -> Result<(), ArchiveError> {
        self.arch_nav_ctrl.serialise(self.nav_ctrl.status())
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::{geom::Point, nav_ctrl::NavCtrlParams, proj::ProjParams};

    fn data_store() -> DataStore {
        DataStore::new(
            NavCtrl::new(NavCtrlParams::default()).unwrap(),
            FieldDims::new(640.0, 480.0)
        )
    }

    #[test]
    fn test_apply_frame() {
        let mut ds = data_store();
        let projector = Projector::new(ProjParams { shape_scale: 1.0, ..Default::default() })
            .unwrap();

        ds.apply_frame(
            Frame {
                vehicle_corners: vec![
                    Point::new(340.0, 240.0),
                    Point::new(310.0, 230.0),
                    Point::new(310.0, 250.0),
                ],
                targets: Some(vec![Point::new(500.0, 240.0)]),
                intent: Some(PathIntent { towards_goal: true, reverse: false }),
            },
            &projector
        ).unwrap();

        let pose = ds.pose.as_ref().unwrap();
        assert!((pose.center.x - 320.0).abs() < 1e-9);
        assert_eq!(ds.nav_ctrl.num_targets(), 1);
        assert!(ds.intent.towards_goal);

        // A bad pose still applies the planner's update
        let res = ds.apply_frame(
            Frame {
                vehicle_corners: vec![],
                targets: Some(vec![]),
                intent: None,
            },
            &projector
        );
        assert!(res.is_err());
        assert_eq!(ds.nav_ctrl.num_targets(), 0);
    }

    #[test]
    fn test_new_frame_only_for_this_cycle() {
        let mut ds = data_store();
        let projector = Projector::new(ProjParams::default()).unwrap();
        let frame = Frame {
            vehicle_corners: vec![
                Point::new(340.0, 240.0),
                Point::new(310.0, 230.0),
                Point::new(310.0, 250.0),
            ],
            targets: None,
            intent: None,
        };

        ds.cycle_start(0.0);
        assert!(!ds.new_frame);
        ds.apply_frame(frame.clone(), &projector).unwrap();
        assert!(ds.new_frame);

        // The pose is kept but is no longer new
        ds.cycle_start(0.1);
        assert!(!ds.new_frame);
        assert!(ds.pose.is_some());

        // A failed frame doesn't count
        let bad = Frame { vehicle_corners: vec![], ..frame };
        assert!(ds.apply_frame(bad, &projector).is_err());
        assert!(!ds.new_frame);
    }

    #[test]
    fn test_goal_leg_event_clears_intent() {
        let mut ds = data_store();
        ds.intent = PathIntent { towards_goal: true, reverse: true };
        ds.nav_ctrl_output.events.push(NavEvent::GoalLegComplete);
        ds.nav_ctrl_output.cmds.push(ActCmd::STOP);

        ds.handle_nav_events();
        assert!(!ds.run_complete);

        assert_eq!(ds.intent, PathIntent { towards_goal: false, reverse: true });
        assert_eq!(ds.num_goal_deliveries, 1);
        assert_eq!(ds.num_cmds_sent, 1);

        ds.cycle_start(1.0);
        ds.nav_ctrl_output.events.push(NavEvent::RunComplete);
        ds.handle_nav_events();
        assert!(ds.run_complete);
        assert!(ds.run_summary(1.0).run_complete);
    }
}

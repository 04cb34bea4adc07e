//! Main navigation executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise all modules
//!     - Main loop:
//!         - Frame acquisition (vision and planner output)
//!         - Projection of the vehicle marker
//!         - Navigation control processing, sending commands to the actuator controller
//!         - Archiving
//!         - Cycle management
//!
//! Frames are replayed from a frame script, the first argument to the executable.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use color_eyre::{eyre::{eyre, WrapErr}, Report};
use log::{debug, error, info, warn};
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};
use structopt::StructOpt;

// Internal
use nav_lib::{
    data_store::DataStore,
    frame::Frame,
    mech_client::MechClient,
    nav_ctrl::{NavCtrl, NavCtrlParams, NavInput},
    params::NavExecParams,
    proj::{ProjParams, Projector},
};
use util::{
    host,
    logger::{logger_init, parse_level},
    script_interpreter::{Pending, ScriptInterpreter},
    session::{self, Session},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, StructOpt)]
#[structopt(name = "nav_exec", about = "Collector navigation executable")]
struct Opts {
    /// Frame script to replay
    #[structopt(parse(from_os_str))]
    script: PathBuf,

    /// Don't connect to the actuator controller
    #[structopt(long)]
    headless: bool,

    /// Minimum log level, one of trace, debug or info
    #[structopt(long, default_value = "debug")]
    log_level: String,
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opts = Opts::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new(
        "nav_exec",
        "sessions"
    ).wrap_err("Failed to create the session")?;

    // Initialise logger
    let log_level = parse_level(&opts.log_level)
        .ok_or_else(|| eyre!("Unknown log level \"{}\"", opts.log_level))?;
    logger_init(log_level, &session)
        .wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Collector Navigation Executable\n");
    info!("Running on: {}", host::get_hostname().unwrap_or_else(|| "unknown host".into()));
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let exec_params: NavExecParams = util::params::load("nav_exec.toml")
        .wrap_err("Could not load nav_exec params")?;
    let nav_ctrl_params: NavCtrlParams = util::params::load("nav_ctrl.toml")
        .wrap_err("Could not load nav_ctrl params")?;
    let proj_params: ProjParams = util::params::load("proj.toml")
        .wrap_err("Could not load proj params")?;

    info!("Exec parameters loaded");

    if !(exec_params.cycle_period_s > 0.0 && exec_params.cycle_period_s.is_finite()) {
        return Err(eyre!(
            "The cycle period must be positive, found {}", exec_params.cycle_period_s
        ));
    }
    let cycle_period = Duration::from_secs_f64(exec_params.cycle_period_s);

    // ---- INITIALISE FRAME SOURCE ----

    info!("Loading frame script from {:?}", opts.script);

    let mut script: ScriptInterpreter<Frame> = ScriptInterpreter::new(&opts.script)
        .wrap_err("Failed to load the frame script")?;

    info!(
        "Loaded script lasts {:.02} s and contains {} frames\n",
        script.get_duration(),
        script.get_num_entries()
    );

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let projector = Projector::new(proj_params)
        .wrap_err("Failed to initialise the Projector")?;
    info!("Projector init complete");

    let nav_ctrl = NavCtrl::new(nav_ctrl_params)
        .wrap_err("Failed to initialise NavCtrl")?;
    info!("NavCtrl init complete");

    let mut ds = DataStore::new(nav_ctrl, exec_params.field);
    ds.init_archives(&session)
        .wrap_err("Failed to open the archives")?;

    info!("Module initialisation complete\n");

    // ---- INITIALISE NETWORK ----

    let mut mech_client = if opts.headless {
        info!("Running headless, no commands will reach the vehicle");
        MechClient::disabled()
    }
    else {
        match MechClient::connect(&exec_params) {
            Ok(c) => {
                info!("MechClient initialised");
                c
            },
            Err(e) if exec_params.exit_on_link_fail => {
                return Err(e).wrap_err("Failed to initialise MechClient")
            },
            Err(e) => {
                error!("Could not connect to the actuator controller, continuing without it: {}", e);
                MechClient::disabled()
            }
        }
    };

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    loop {
        // Get cycle start time
        let cycle_start_instant = Instant::now();

        ds.cycle_start(session::get_elapsed_seconds());

        // ---- DATA INPUT ----

        match script.get_pending_at(ds.time_s) {
            Pending::None => (),
            Pending::Some(frames) => {
                for frame in frames {
                    if let Err(e) = ds.apply_frame(frame, &projector) {
                        warn!("Could not use frame: {}", e);
                        ds.num_bad_frames += 1;
                    }
                }
            },
            // Exit if end of script reached
            Pending::EndOfScript => {
                info!("End of frame script reached, stopping");
                break
            }
        }

        // ---- CONTROL ALGORITHM PROCESSING ----

        // One tick per new frame, the controller never sees the same pose twice
        match ds.pose.clone() {
            Some(pose) if ds.new_frame => {
                let input = NavInput {
                    pose,
                    intent: ds.intent,
                    field: ds.field,
                    time_s: ds.time_s,
                };

                ds.nav_ctrl_output = ds.nav_ctrl.step(&input, &mut mech_client);
                ds.handle_nav_events();

                debug!("NavCtrl mode: {:?}", ds.nav_ctrl_output.mode);
            },
            _ => ()
        }

        // ---- WRITE ARCHIVES ----

        ds.cycle_end();

        if ds.run_complete {
            info!("Run complete, stopping");
            break
        }

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        match cycle_period.checked_sub(cycle_dur) {
            Some(d) => {
                ds.num_consec_cycle_overruns = 0;
                thread::sleep(d);
            },
            None => {
                warn!(
                    "Cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64() - cycle_period.as_secs_f64()
                );
                ds.num_consec_cycle_overruns += 1;
            }
        }
    }

    // ---- SHUTDOWN ----

    let stop = ds.nav_ctrl.stop(&mut mech_client);
    ds.nav_ctrl_output.cmds.extend(stop.cmds);

    session.save(
        "nav_ctrl/run_summary.json",
        ds.run_summary(session::get_elapsed_seconds())
    );

    info!("End of execution");

    session.exit();

    Ok(())
}

//! Main navigation executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise the session, logging and parameters
//!     - Calibrate the camera against the map
//!     - Initialise all modules and the network
//!     - Main loop:
//!         - Telecommand processing and handling
//!         - Navigation control processing (position fix, heading control, wheel demands)
//!         - Archive writing
//!         - Simulation update (if simulating)

// ---------------------------------------------------------------------------
// USE MODULES FROM LIBRARY
// ---------------------------------------------------------------------------

use comms_if::net::{zmq, NetParams};
use nav_lib::{
    calib::{self, Calibration},
    clock::SessionClock,
    drive_ctrl::{self, DriveMapper},
    head_ctrl::{self, PidController},
    loc::{self, Estimator},
    mech_client::MechClient,
    nav_ctrl::{self, NavCtrl, NavIo, NavState},
    params::{NavExecParams, PosSourceKind},
    pos_client::PosClient,
    sim::{self, SimRover},
    tc_client::{TcClient, TcClientError}
};

mod tc_processor;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{info, warn};
use std::thread;
use std::time::{Duration, Instant};
use color_eyre::{Report, eyre::{WrapErr, eyre}};

// Internal
use util::{
    archive::Archived,
    logger::{logger_init, LevelFilter},
    session::Session
};

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new(
        "nav_exec",
        "sessions"
    ).wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, &session)
        .wrap_err("Failed to initialise logging")?;

    info!("Waypoint Navigation Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let exec_params: NavExecParams = util::params::load("nav_exec.toml")
        .wrap_err("Could not load exec params")?;
    let calib_params: calib::Params = util::params::load("calib.toml")
        .wrap_err("Could not load calibration params")?;
    let loc_params: loc::Params = util::params::load("loc.toml")
        .wrap_err("Could not load Loc params")?;
    let head_ctrl_params: head_ctrl::Params = util::params::load("head_ctrl.toml")
        .wrap_err("Could not load HeadCtrl params")?;
    let drive_ctrl_params: drive_ctrl::Params = util::params::load("drive_ctrl.toml")
        .wrap_err("Could not load DriveCtrl params")?;
    let nav_ctrl_params: nav_ctrl::Params = util::params::load("nav_ctrl.toml")
        .wrap_err("Could not load NavCtrl params")?;
    let net_params: NetParams = util::params::load("net.toml")
        .wrap_err("Could not load net params")?;

    info!("Exec parameters loaded");

    if !exec_params.start_on_launch && !exec_params.tc_enabled {
        return Err(eyre!(
            "Navigation can never begin since both start_on_launch and tc_enabled are false"
        ))
    }

    // ---- CALIBRATION ----

    let calib = Calibration::from_params(&calib_params)
        .wrap_err("Calibration failed, navigation cannot begin")?;

    info!(
        "Calibrated {:?} px onto a {} x {} in map",
        calib.pixel_corners(),
        calib_params.map_width,
        calib_params.map_height
    );

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let estimator = Estimator::new(loc_params, exec_params.fix_unit, Some(calib.clone()))
        .wrap_err("Failed to initialise Loc")?;
    let pid = PidController::new(head_ctrl_params);
    let mapper = DriveMapper::new(drive_ctrl_params)
        .wrap_err("Failed to initialise DriveCtrl")?;

    // ---- INITIALISE NETWORK ----

    info!("Initialising network");

    let zmq_ctx = zmq::Context::new();

    let (io, sim) = match exec_params.pos_source {
        PosSourceKind::Sim => {
            let sim_params: sim::Params = util::params::load("sim.toml")
                .wrap_err("Could not load sim params")?;
            let sim = SimRover::new(sim_params, exec_params.fix_unit, Some(calib.clone()))
                .wrap_err("Failed to initialise the simulation")?;
            info!("Simulation initialised");

            let io = NavIo {
                source: Box::new(sim.clone()),
                actuator: Box::new(sim.clone()),
                clock: Box::new(sim.clone())
            };
            (io, Some(sim))
        },
        PosSourceKind::Remote => {
            let pos_client = PosClient::new(
                &zmq_ctx,
                &net_params.pos_endpoint,
                exec_params.pos_recv_timeout_ms
            ).wrap_err("Failed to initialise PosClient")?;
            info!("PosClient initialised");

            let mech_client = MechClient::new(
                &zmq_ctx,
                &net_params.mech_endpoint,
                exec_params.mech_recv_timeout_ms
            ).wrap_err("Failed to initialise MechClient")?;
            info!("MechClient initialised");

            let io = NavIo {
                source: Box::new(pos_client),
                actuator: Box::new(mech_client),
                clock: Box::new(SessionClock::new())
            };
            (io, None)
        }
    };

    let tc_client = match exec_params.tc_enabled {
        true => {
            let c = TcClient::new(&zmq_ctx, &net_params.tc_endpoint)
                .wrap_err("Failed to initialise the TcClient")?;
            info!("TcClient initialised");
            Some(c)
        },
        false => None
    };

    info!("Network initialisation complete");

    let cycle_period_s = nav_ctrl_params.tick_period_s;

    let mut nav_ctrl = NavCtrl::new(nav_ctrl_params, estimator, pid, mapper, io)
        .wrap_err("Failed to initialise NavCtrl")?;

    if exec_params.archive_enabled {
        nav_ctrl.init_archive(&session)
            .wrap_err("Failed to initialise the NavCtrl archive")?;
    }

    info!("Module initialisation complete\n");

    if exec_params.start_on_launch {
        nav_ctrl.begin().wrap_err("Could not begin navigation")?;
    }
    else {
        info!("Waiting for a Start telecommand");
    }

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    let cycle_period = Duration::from_secs_f64(cycle_period_s);
    let mut num_cycles: u64 = 0;

    loop {

        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // ---- TELECOMMAND PROCESSING ----

        if let Some(ref client) = tc_client {
            // Get commands until none remain
            loop {
                match client.receive_tc() {
                    Ok(Some(tc)) => {
                        let response = tc_processor::exec(&mut nav_ctrl, &tc);

                        if let Err(e) = client.send_response(response) {
                            warn!("Could not respond to TC: {}", e)
                        }
                    },
                    Ok(None) => break,
                    Err(TcClientError::TcParseError(e)) => {
                        warn!("Could not parse recieved TC: {}", e);
                        break
                    },
                    Err(e) => {
                        warn!("Error while receiving TCs: {}", e);
                        break
                    }
                }
            }
        }

        // ---- NAVIGATION CONTROL PROCESSING ----

        let report = nav_ctrl.step()
            .wrap_err("A fatal error occured in NavCtrl")?;

        // ---- WRITE ARCHIVES ----

        if exec_params.archive_enabled {
            if let Err(e) = nav_ctrl.write() {
                warn!("Could not write the NavCtrl archive: {}", e)
            }
        }

        if report.state == NavState::Complete {
            break
        }

        // ---- SIMULATION ----

        if let Some(ref s) = sim {
            s.advance(cycle_period_s);
        }

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        match cycle_period.checked_sub(cycle_dur) {
            Some(d) => thread::sleep(d),
            None => warn!(
                "Cycle overran by {:.06} s",
                cycle_dur.as_secs_f64() - cycle_period_s
            )
        }

        num_cycles += 1;
    }

    // ---- SHUTDOWN ----

    if let Some(ref s) = sim {
        let p = s.position();
        info!(
            "Simulated vehicle finished at ({:.2}, {:.2}) heading {:.1} deg",
            p[0], p[1], s.heading_deg()
        );
    }

    info!("Navigation complete after {} cycles", num_cycles);
    info!("End of execution");

    Ok(())
}

//! # Telecommand processor module
//!
//! The telecommand processor executes navigation TCs received from the ground.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{info, warn};

// Internal
use comms_if::tc::{NavTc, TcResponse};
use nav_lib::nav_ctrl::NavCtrl;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Execute a telecommand, returning the response to send to the ground.
pub(crate) fn exec(nav_ctrl: &mut NavCtrl, tc: &NavTc) -> TcResponse {

    let result = match tc {
        NavTc::Start { waypoints } => {
            info!("Recieved Start command with {} waypoints", waypoints.len());
            nav_ctrl.start(waypoints)
        },
        NavTc::SetWaypoints { waypoints } => {
            info!("Recieved SetWaypoints command with {} waypoints", waypoints.len());
            nav_ctrl.set_waypoints(waypoints)
        },
        NavTc::Stop => {
            info!("Recieved Stop command");
            nav_ctrl.stop_handle().request();
            Ok(())
        }
    };

    match result {
        Ok(()) => TcResponse::Ok,
        Err(e) => {
            warn!("Cannot execute {:?}: {}", tc, e);
            TcResponse::CannotExecute(format!("{}", e))
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::eqpt::pos::FixUnit;
    use nav_lib::{
        drive_ctrl::{self, DriveMapper},
        head_ctrl::{self, PidController},
        loc::{self, Estimator},
        nav_ctrl::{self, NavIo, NavState, StallPolicy},
        sim::{self, SimRover}
    };

    fn build_nav() -> NavCtrl {
        let sim = SimRover::new(
            sim::Params {
                start_position: [0.0, 0.0],
                start_heading_deg: 0.0,
                full_speed: 20.0,
                turn_rate_rad_s: 2.0,
                turn_creep_per_rad: 0.5,
                fix_noise: 0.0,
                fix_dropout_prob: 0.0,
                seed: 0,
                step_s: 0.01,
            },
            FixUnit::World,
            None
        ).unwrap();

        NavCtrl::new(
            nav_ctrl::Params {
                angle_tolerance_deg: 5.0,
                position_tolerance: 1.0,
                speed: 0.5,
                tick_period_s: 0.1,
                stall_policy: StallPolicy::StopMotion,
                waypoints: Vec::new(),
            },
            Estimator::new(
                loc::Params {
                    min_displacement: 0.01,
                    retry_delay_s: 0.1,
                    max_stall_s: None,
                    initial_heading: None,
                },
                FixUnit::World,
                None
            ).unwrap(),
            PidController::new(head_ctrl::Params {
                k_p: 0.02,
                k_i: 0.0,
                k_d: 0.0,
                sample_interval_s: 0.1,
                conditional_integration: true,
                integral_limit: None,
            }),
            DriveMapper::new(drive_ctrl::Params::default()).unwrap(),
            NavIo {
                source: Box::new(sim.clone()),
                actuator: Box::new(sim.clone()),
                clock: Box::new(sim)
            }
        ).unwrap()
    }

    #[test]
    fn test_start_and_stop() {
        let mut nav = build_nav();

        let r = exec(&mut nav, &NavTc::SetWaypoints { waypoints: vec![[5.0, 5.0]] });
        assert_eq!(r, TcResponse::Ok);
        assert_eq!(nav.state(), NavState::Idle);

        let r = exec(&mut nav, &NavTc::Start { waypoints: vec![[10.0, 0.0]] });
        assert_eq!(r, TcResponse::Ok);
        assert_eq!(nav.state(), NavState::Aligning);

        // Not idle any more
        let r = exec(&mut nav, &NavTc::Start { waypoints: vec![[1.0, 1.0]] });
        assert!(matches!(r, TcResponse::CannotExecute(_)));

        let r = exec(&mut nav, &NavTc::Stop);
        assert_eq!(r, TcResponse::Ok);
        nav.step().unwrap();
        assert_eq!(nav.state(), NavState::Complete);
    }

    #[test]
    fn test_invalid_waypoints() {
        let mut nav = build_nav();

        let r = exec(&mut nav, &NavTc::Start { waypoints: vec![[f64::INFINITY, 0.0]] });
        assert!(matches!(r, TcResponse::CannotExecute(_)));
        assert_eq!(nav.state(), NavState::Idle);
    }
}

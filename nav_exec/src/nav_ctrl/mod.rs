//! # Navigation control module
//!
//! Navigation control drives the vehicle through an ordered list of waypoints.
//! For each waypoint the vehicle first turns on the spot until it faces the
//! waypoint, then advances towards it with a steering correction, falling
//! back to turning on the spot if the heading error grows too large. Every
//! decision is taken on a fresh position fix.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc
};

use serde::{Deserialize, Serialize};

use crate::{
    clock::Clock,
    drive_ctrl::MotorActuator,
    loc::{LocError, PositionSource}
};

pub use params::*;
pub use state::*;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The collaborators navigation control works through.
pub struct NavIo {
    pub source: Box<dyn PositionSource>,

    pub actuator: Box<dyn MotorActuator>,

    pub clock: Box<dyn Clock>,
}

/// A handle used to request that navigation stops.
///
/// Clones share the same request, so a handle can be given to telecommand
/// processing or another thread.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

/// Status report for one tick of navigation control.
///
/// The report is flat so that it can be archived as a CSV row.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StatusReport {
    /// Time at the start of the tick.
    ///
    /// Units: seconds
    pub time_s: f64,

    /// State at the end of the tick
    pub state: NavState,

    /// Index of the current waypoint
    pub cursor: usize,

    pub num_waypoints: usize,

    pub pos_x: Option<f64>,
    pub pos_y: Option<f64>,
    pub heading_deg: Option<f64>,

    pub target_x: Option<f64>,
    pub target_y: Option<f64>,
    pub bearing_deg: Option<f64>,
    pub heading_error_deg: Option<f64>,
    pub distance: Option<f64>,

    pub pid_p: f64,
    pub pid_i: f64,
    pub pid_d: f64,
    pub pid_output: f64,

    /// The heading controller was asked for an output before its sample
    /// interval had elapsed
    pub pid_not_ready: bool,

    /// Demands issued this tick, `None` if nothing was issued
    pub dem_left: Option<f64>,
    pub dem_right: Option<f64>,
    pub dem_left_limited: bool,
    pub dem_right_limited: bool,

    /// Number of failed attempts to get a position fix this tick
    pub pos_stall_attempts: u32,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Navigation states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NavState {
    /// Waiting for waypoints
    Idle,

    /// Turning on the spot to face the current waypoint
    Aligning,

    /// Driving towards the current waypoint
    Advancing,

    /// Within tolerance of the current waypoint
    Arrived,

    /// All waypoints visited, or navigation was stopped
    Complete,
}

/// Wheel behaviour while waiting for a position fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum StallPolicy {
    /// Stop the wheels on the first failed fix
    StopMotion,

    /// Keep executing the last demands
    ContinueLast,
}

#[derive(Debug, thiserror::Error)]
pub enum NavCtrlError {
    #[error("Navigation can only be started or given new waypoints while idle (currently {0:?})")]
    NotIdle(NavState),

    #[error("Waypoint {0} ({1}, {2}) is not finite")]
    InvalidWaypoint(usize, f64, f64),

    #[error("Invalid navigation parameter: {0}")]
    InvalidParam(&'static str),

    #[error("Localisation error: {0}")]
    LocError(LocError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request that navigation stops.
    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst)
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

impl Default for NavState {
    fn default() -> Self {
        NavState::Idle
    }
}

impl Default for StallPolicy {
    fn default() -> Self {
        StallPolicy::StopMotion
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_stop_handle_shared() {
        let a = StopHandle::new();
        let b = a.clone();

        assert!(!b.is_requested());
        a.request();
        assert!(b.is_requested());
    }

    #[test]
    fn test_report_serialises() {
        let report = StatusReport {
            state: NavState::Advancing,
            cursor: 1,
            num_waypoints: 2,
            distance: Some(3.5),
            ..Default::default()
        };

        let v = serde_json::to_value(&report).unwrap();
        assert_eq!(v["state"], "Advancing");
        assert_eq!(v["distance"], 3.5);
        assert!(v["dem_left"].is_null());
    }
}

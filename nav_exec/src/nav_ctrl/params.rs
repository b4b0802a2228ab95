//! Navigation control parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;

// Internal
use super::StallPolicy;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for navigation control
#[derive(Deserialize, Debug, Clone)]
pub struct Params {

    /// Heading errors within this band are considered aligned.
    ///
    /// Units: degrees
    pub angle_tolerance_deg: f64,

    /// The vehicle has arrived when it is within this distance of the
    /// waypoint.
    ///
    /// Units: inches
    pub position_tolerance: f64,

    /// Throttle used when advancing towards a waypoint, in `[0, 1]`.
    pub speed: f64,

    /// Period of the control loop.
    ///
    /// Units: seconds
    pub tick_period_s: f64,

    /// What to do with the wheels while waiting for a position fix.
    #[serde(default)]
    pub stall_policy: StallPolicy,

    /// Waypoints to load on startup, as `[x, y]` pairs.
    ///
    /// Units: inches
    #[serde(default)]
    pub waypoints: Vec<[f64; 2]>,
}

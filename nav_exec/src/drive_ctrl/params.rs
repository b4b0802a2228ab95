//! Parameters structure for DriveCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for drive control.
///
/// These describe how the motors are wired to the driver, so that a reversed
/// motor or swapped channels can be corrected without touching the code.
#[derive(Debug, Clone, Deserialize)]
pub struct Params {

    /// If true the left and right demands are exchanged before being sent.
    pub swap_sides: bool,

    /// Multiplier applied to the left demand, either +1 or -1.
    pub left_polarity: f64,

    /// Multiplier applied to the right demand, either +1 or -1.
    pub right_polarity: f64,

    /// Multiplier applied to the steer of a steered advance, either +1 or -1.
    ///
    /// With -1 a positive steer turns the same way in an advance as it does
    /// in a pure rotation.
    pub advance_steer_sign: f64,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            swap_sides: false,
            left_polarity: 1.0,
            right_polarity: 1.0,
            advance_steer_sign: -1.0
        }
    }
}

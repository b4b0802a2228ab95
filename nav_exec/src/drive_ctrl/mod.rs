//! # Drive control module
//!
//! Converts speed and steering demands into throttles for the two wheels of
//! the differential drive.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::mech::{WheelDems, WheelId};

// Internal
pub use params::*;
pub use state::*;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Something which can drive the wheels, such as the motor driver.
///
/// Demands are fire-and-forget: the last demand written to a wheel holds
/// until it is replaced.
pub trait MotorActuator {
    /// Set the throttle of a single wheel, in `[-1, 1]`.
    fn set_throttle(&mut self, wheel: WheelId, throttle: f64) -> Result<(), ActuatorError>;

    /// Set the throttle of both wheels.
    ///
    /// Both wheels are always written, the first error is returned.
    fn set_dems(&mut self, dems: &WheelDems) -> Result<(), ActuatorError> {
        let l = self.set_throttle(WheelId::Left, dems.left);
        let r = self.set_throttle(WheelId::Right, dems.right);
        l.and(r)
    }
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during DriveCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum DriveCtrlError {
    #[error("Wheel polarity must be +1 or -1, found {0}")]
    InvalidPolarity(f64),

    #[error("Advance steer sign must be +1 or -1, found {0}")]
    InvalidSteerSign(f64),
}

/// Errors reported by a motor actuator.
#[derive(Debug, thiserror::Error)]
pub enum ActuatorError {
    #[error("The actuator rejected the demands")]
    DemsRejected,

    #[error("The actuator equipment is invalid")]
    EqptInvalid,

    #[error("Could not communicate with the actuator: {0}")]
    CommsError(String),
}

//! Implementations for the DriveMapper structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use comms_if::eqpt::mech::WheelDems;
use log::trace;
use serde::Serialize;

// Internal
use super::{DriveCtrlError, Params};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Maps manoeuvres onto wheel throttles.
#[derive(Debug, Clone)]
pub struct DriveMapper {
    params: Params,
}

/// Wheel demands produced by the mapper along with its status report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriveOutput {
    pub dems: WheelDems,

    pub report: StatusReport,
}

/// Status report for a single mapping.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq)]
pub struct StatusReport {
    /// The left demand was outside `[-1, 1]` and has been clamped
    pub left_limited: bool,

    /// The right demand was outside `[-1, 1]` and has been clamped
    pub right_limited: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl DriveMapper {

    /// Create a new mapper, checking the polarities and steer sign are valid.
    pub fn new(params: Params) -> Result<Self, DriveCtrlError> {
        for p in [params.left_polarity, params.right_polarity].iter() {
            if !is_unit_sign(*p) {
                return Err(DriveCtrlError::InvalidPolarity(*p))
            }
        }
        if !is_unit_sign(params.advance_steer_sign) {
            return Err(DriveCtrlError::InvalidSteerSign(params.advance_steer_sign))
        }

        Ok(Self { params })
    }

    /// Turn on the spot. Positive steer drives the left wheel forward.
    pub fn pure_rotation(&self, steer: f64) -> DriveOutput {
        self.map(steer, -steer)
    }

    /// Drive forward at `speed` while steering. The steer is first
    /// multiplied by `advance_steer_sign`, after which a positive value makes
    /// the right wheel faster.
    pub fn steered_advance(&self, speed: f64, steer: f64) -> DriveOutput {
        let steer = steer * self.params.advance_steer_sign;
        self.map(speed - steer, speed + steer)
    }

    /// Stop both wheels.
    pub fn stop(&self) -> DriveOutput {
        self.map(0.0, 0.0)
    }

    /// Limit the demands then apply the wiring corrections.
    fn map(&self, left: f64, right: f64) -> DriveOutput {
        let (left, left_limited) = limit(left);
        let (right, right_limited) = limit(right);

        let (left, right) = match self.params.swap_sides {
            false => (left, right),
            true => (right, left)
        };

        let dems = WheelDems {
            left: left * self.params.left_polarity,
            right: right * self.params.right_polarity
        };

        trace!("DriveCtrl demands: left {:.3}, right {:.3}", dems.left, dems.right);

        DriveOutput {
            dems,
            report: StatusReport {
                left_limited,
                right_limited
            }
        }
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn is_unit_sign(s: f64) -> bool {
    s == 1.0 || s == -1.0
}

/// Clamp a throttle into `[-1, 1]`, returning whether it was limited.
///
/// Non-finite values are replaced by zero.
fn limit(throttle: f64) -> (f64, bool) {
    if !throttle.is_finite() {
        return (0.0, true)
    }

    let t = util::maths::clamp(&throttle, &-1.0, &1.0);
    (t, t != throttle)
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

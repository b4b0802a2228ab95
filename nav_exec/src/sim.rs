//! # Simulation
//!
//! A kinematic model of the differential drive vehicle, used to run the
//! navigation software without hardware. The simulated vehicle is at once the
//! position source (standing in for the overhead camera), the motor actuator
//! and the clock, so that time only passes when the control loop sleeps.
//!
//! The vehicle turns at a rate proportional to the throttle difference and
//! moves at a speed proportional to the mean throttle. Turning on the spot
//! also scrubs the vehicle slightly forward, which is what makes its heading
//! observable to the camera while it pivots.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use comms_if::eqpt::{
    mech::{WheelDems, WheelId},
    pos::{FixUnit, PosFix},
};
use log::debug;
use nalgebra::Vector2;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::Deserialize;

use crate::{
    calib::Calibration,
    clock::Clock,
    drive_ctrl::{ActuatorError, MotorActuator},
    loc::{LocError, PositionSource},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters of the simulated vehicle.
#[derive(Debug, Clone, Deserialize)]
pub struct Params {
    /// Starting position in the map frame.
    ///
    /// Units: inches
    pub start_position: [f64; 2],

    /// Starting heading from the map +X axis.
    ///
    /// Units: degrees
    pub start_heading_deg: f64,

    /// Forward speed with both wheels at full throttle.
    ///
    /// Units: inches/second
    pub full_speed: f64,

    /// Turn rate with the wheels at full opposing throttle.
    ///
    /// Units: radians/second
    pub turn_rate_rad_s: f64,

    /// Forward distance travelled per radian turned.
    ///
    /// Units: inches/radian
    pub turn_creep_per_rad: f64,

    /// Amplitude of the uniform noise added to each fix, in the fix's units.
    pub fix_noise: f64,

    /// Probability that a fix request finds no marker.
    pub fix_dropout_prob: f64,

    /// Seed for the noise generator
    pub seed: u64,

    /// Integration step.
    ///
    /// Units: seconds
    pub step_s: f64,
}

/// Handle to a simulated vehicle.
///
/// Clones share the same vehicle.
#[derive(Clone)]
pub struct SimRover {
    inner: Arc<Mutex<SimState>>,
}

struct SimState {
    params: Params,
    unit: FixUnit,
    calib: Option<Calibration>,
    rng: StdRng,

    time_s: f64,
    position: Vector2<f64>,
    heading_rad: f64,
    dems: WheelDems,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("Pixel fixes require a calibration but none was provided")]
    MissingCalibration,

    #[error("Invalid simulation parameter: {0}")]
    InvalidParam(&'static str),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SimRover {
    /// Create a new simulated vehicle reporting fixes in `unit`.
    pub fn new(params: Params, unit: FixUnit, calib: Option<Calibration>) -> Result<Self, SimError> {
        if unit == FixUnit::Pixel && calib.is_none() {
            return Err(SimError::MissingCalibration);
        }
        if !(params.step_s > 0.0) {
            return Err(SimError::InvalidParam("step_s must be positive"));
        }
        if !(0.0..=1.0).contains(&params.fix_dropout_prob) {
            return Err(SimError::InvalidParam("fix_dropout_prob must be in [0, 1]"));
        }

        let state = SimState {
            rng: StdRng::seed_from_u64(params.seed),
            time_s: 0.0,
            position: Vector2::new(params.start_position[0], params.start_position[1]),
            heading_rad: params.start_heading_deg.to_radians(),
            dems: WheelDems::stop(),
            unit,
            calib,
            params,
        };

        Ok(Self {
            inner: Arc::new(Mutex::new(state)),
        })
    }

    /// Move the simulation forward by `dt_s` seconds under the current demands.
    pub fn advance(&self, dt_s: f64) {
        if !(dt_s > 0.0) || !dt_s.is_finite() {
            return;
        }

        let mut s = self.state();

        let n = (dt_s / s.params.step_s).ceil().max(1.0) as usize;
        let h = dt_s / n as f64;

        let v = 0.5 * (s.dems.left + s.dems.right) * s.params.full_speed;
        let omega = 0.5 * (s.dems.left - s.dems.right) * s.params.turn_rate_rad_s;

        for _ in 0..n {
            let dtheta = omega * h;
            s.heading_rad += dtheta;

            let dist = v * h + s.params.turn_creep_per_rad * dtheta.abs();
            let dir = Vector2::new(s.heading_rad.cos(), s.heading_rad.sin());
            s.position += dir * dist;
        }

        s.time_s += dt_s;
    }

    /// True position of the vehicle in the map frame.
    pub fn position(&self) -> Vector2<f64> {
        self.state().position
    }

    /// True heading of the vehicle in degrees, in (-180, 180].
    pub fn heading_deg(&self) -> f64 {
        util::maths::norm_angle_deg(self.state().heading_rad.to_degrees())
    }

    /// The demands currently applied to the wheels.
    pub fn dems(&self) -> WheelDems {
        self.state().dems
    }

    fn state(&self) -> MutexGuard<SimState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PositionSource for SimRover {
    fn get_fix(&mut self) -> Result<PosFix, LocError> {
        let mut s = self.state();

        let dropout = s.params.fix_dropout_prob;
        if dropout > 0.0 && s.rng.random::<f64>() < dropout {
            return Err(LocError::PositionUnavailable("marker not detected".into()));
        }

        let p = match (s.unit, &s.calib) {
            (FixUnit::World, _) => s.position,
            (FixUnit::Pixel, Some(c)) => c
                .to_pixel(s.position)
                .map_err(|e| LocError::PositionUnavailable(format!("{}", e)))?,
            (FixUnit::Pixel, None) => return Err(LocError::MissingCalibration),
        };

        let amp = s.params.fix_noise;
        let (nx, ny) = match amp > 0.0 {
            true => (
                amp * (2.0 * s.rng.random::<f64>() - 1.0),
                amp * (2.0 * s.rng.random::<f64>() - 1.0),
            ),
            false => (0.0, 0.0),
        };

        Ok(PosFix::now(p[0] + nx, p[1] + ny, s.unit))
    }
}

impl MotorActuator for SimRover {
    fn set_throttle(&mut self, wheel: WheelId, throttle: f64) -> Result<(), ActuatorError> {
        if !throttle.is_finite() || throttle.abs() > 1.0 {
            return Err(ActuatorError::DemsRejected);
        }

        self.state().dems.set(wheel, throttle);
        Ok(())
    }

    fn set_dems(&mut self, dems: &WheelDems) -> Result<(), ActuatorError> {
        if !dems.is_valid() {
            return Err(ActuatorError::DemsRejected);
        }

        debug!("Sim demands: left {:.3}, right {:.3}", dems.left, dems.right);
        self.state().dems = *dems;
        Ok(())
    }
}

impl Clock for SimRover {
    fn now_s(&self) -> f64 {
        self.state().time_s
    }

    fn sleep(&mut self, duration_s: f64) {
        self.advance(duration_s)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn params() -> Params {
        Params {
            start_position: [0.0, 0.0],
            start_heading_deg: 0.0,
            full_speed: 20.0,
            turn_rate_rad_s: 2.0,
            turn_creep_per_rad: 0.5,
            fix_noise: 0.0,
            fix_dropout_prob: 0.0,
            seed: 0,
            step_s: 0.01,
        }
    }

    #[test]
    fn test_straight_line() {
        let mut sim = SimRover::new(params(), FixUnit::World, None).unwrap();

        sim.set_dems(&WheelDems { left: 0.5, right: 0.5 }).unwrap();
        sim.sleep(1.0);

        assert!((sim.position() - Vector2::new(10.0, 0.0)).norm() < 1e-9);
        assert!((sim.now_s() - 1.0).abs() < 1e-12);
        assert_eq!(sim.heading_deg(), 0.0);
    }

    #[test]
    fn test_pivot_creeps_forward() {
        let mut sim = SimRover::new(params(), FixUnit::World, None).unwrap();

        // Positive rotation at full rate for a quarter turn
        sim.set_dems(&WheelDems { left: 1.0, right: -1.0 }).unwrap();
        sim.sleep(std::f64::consts::FRAC_PI_4);

        assert!((sim.heading_deg() - 90.0).abs() < 1e-6);

        // Moved about pi/4 inches along an arc curving from +X to +Y
        let p = sim.position();
        assert!(p.norm() > 0.5 && p.norm() < 0.8, "{}", p);
        assert!(p[0] > 0.0 && p[1] > 0.0);
    }

    #[test]
    fn test_rejects_invalid_dems() {
        let mut sim = SimRover::new(params(), FixUnit::World, None).unwrap();

        assert!(sim.set_throttle(WheelId::Left, 1.5).is_err());
        assert!(sim.set_dems(&WheelDems { left: f64::NAN, right: 0.0 }).is_err());
        assert!(sim.set_throttle(WheelId::Right, -0.25).is_ok());
        assert_eq!(sim.dems(), WheelDems { left: 0.0, right: -0.25 });
    }

    #[test]
    fn test_pixel_fixes() {
        let cal = Calibration::from_map_dims(
            [[58.0, 23.0], [760.0, 23.0], [58.0, 469.0], [760.0, 469.0]],
            142.0,
            92.0,
        )
        .unwrap();

        assert!(matches!(
            SimRover::new(params(), FixUnit::Pixel, None),
            Err(SimError::MissingCalibration)
        ));

        let mut p = params();
        p.start_position = [71.0, 46.0];
        let mut sim = SimRover::new(p, FixUnit::Pixel, Some(cal)).unwrap();

        let fix = sim.get_fix().unwrap();
        assert_eq!(fix.unit, FixUnit::Pixel);
        assert!((fix.x - 409.0).abs() < 1e-6);
        assert!((fix.y - 246.0).abs() < 1e-6);
    }

    #[test]
    fn test_noise_and_dropout() {
        let mut p = params();
        p.fix_noise = 0.5;
        p.fix_dropout_prob = 0.5;
        let mut sim = SimRover::new(p, FixUnit::World, None).unwrap();

        let mut fixes = 0;
        let mut dropouts = 0;
        for _ in 0..200 {
            match sim.get_fix() {
                Ok(f) => {
                    fixes += 1;
                    assert!(f.x.abs() <= 0.5 && f.y.abs() <= 0.5);
                }
                Err(LocError::PositionUnavailable(_)) => dropouts += 1,
                Err(e) => panic!("Unexpected error: {}", e),
            }
        }

        assert!(fixes > 0 && dropouts > 0);
    }
}

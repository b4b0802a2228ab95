//! # Localisation module
//!
//! This module tracks the pose of the vehicle from the fixes supplied by the
//! overhead observer. There is no onboard compass, so the heading is inferred
//! from the direction of travel between consecutive fixes.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::pos::{FixUnit, PosFix};
use log::{debug, trace, warn};
use nalgebra::Vector2;

use crate::{
    calib::{Calibration, CalibrationError},
    clock::Clock
};
pub use params::*;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A source of position fixes, such as the overhead camera.
pub trait PositionSource {
    /// Get the latest fix.
    ///
    /// Transient failures (no marker visible, server not responding) shall
    /// be reported as [`LocError::PositionUnavailable`].
    fn get_fix(&mut self) -> Result<PosFix, LocError>;
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The current pose of the vehicle in the map frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {

    /// Position in the map frame.
    ///
    /// Units: inches
    pub position: Vector2<f64>,

    /// Unit vector pointing along the vehicle's direction of travel, `None`
    /// until the vehicle has moved far enough for it to be measured.
    pub heading: Option<Vector2<f64>>,
}

/// Estimates the pose of the vehicle from a stream of fixes.
pub struct Estimator {
    params: Params,

    /// Units the position source is configured to report in
    unit: FixUnit,

    calib: Option<Calibration>,

    pose: Pose,

    /// Position of the previous fix, `None` before the first fix
    prev_position: Option<Vector2<f64>>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum LocError {
    #[error("Position unavailable: {0}")]
    PositionUnavailable(String),

    #[error("No position fix for {0:.3} s, exceeding the {1:.3} s limit")]
    PositionStalled(f64, f64),

    #[error("Waiting for a position fix was aborted after {0} attempts")]
    Aborted(u32),

    #[error("Pixel fixes require a calibration but none was provided")]
    MissingCalibration,

    #[error("The initial heading must be a finite non-zero vector")]
    InvalidInitialHeading,

    #[error("Could not convert the fix into world units: {0}")]
    CalibrationError(CalibrationError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Pose {

    /// Heading as an angle from the +X axis in degrees, in (-180, 180].
    ///
    /// An undefined heading reads as zero.
    pub fn heading_deg(&self) -> f64 {
        match self.heading {
            Some(h) => util::maths::heading_deg(h[0], h[1]),
            None => 0.0
        }
    }
}

impl Estimator {

    /// Create a new estimator for a position source reporting in `unit`.
    ///
    /// A calibration must be given if the source reports pixels.
    pub fn new(
        params: Params,
        unit: FixUnit,
        calib: Option<Calibration>
    ) -> Result<Self, LocError> {
        if unit == FixUnit::Pixel && calib.is_none() {
            return Err(LocError::MissingCalibration)
        }

        let heading = match params.initial_heading {
            Some(h) => {
                let h = Vector2::new(h[0], h[1]);
                let n = h.norm();
                if !(n > 0.0) || !n.is_finite() {
                    return Err(LocError::InvalidInitialHeading)
                }
                Some(h / n)
            },
            None => None
        };

        Ok(Self {
            params,
            unit,
            calib,
            pose: Pose {
                position: Vector2::zeros(),
                heading
            },
            prev_position: None
        })
    }

    /// The most recent pose estimate.
    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    /// Acquire a new fix and update the pose.
    ///
    /// If the source can't provide a fix the estimator waits
    /// `retry_delay_s` on the clock and tries again, until a fix is obtained
    /// or the maximum stall time is exceeded. After every failed attempt
    /// `on_unavailable` is called with the error and the attempt number
    /// (starting from 1); returning `false` aborts the wait.
    pub fn refresh<F>(
        &mut self,
        source: &mut dyn PositionSource,
        clock: &mut dyn Clock,
        mut on_unavailable: F
    ) -> Result<Pose, LocError>
    where
        F: FnMut(&LocError, u32) -> bool
    {
        let start_s = clock.now_s();
        let mut attempt = 0u32;

        loop {
            let err = match self.acquire(source) {
                Ok(p) => {
                    if attempt > 0 {
                        debug!("Position fix recovered after {} attempts", attempt);
                    }
                    return Ok(self.update(p))
                },
                Err(e) => e
            };

            attempt += 1;

            if attempt == 1 {
                warn!("Could not get a position fix, retrying: {}", err);
            }
            else {
                trace!("Position fix attempt {} failed: {}", attempt, err);
            }

            if !on_unavailable(&err, attempt) {
                return Err(LocError::Aborted(attempt))
            }

            if let Some(max_s) = self.params.max_stall_s {
                let stalled_s = clock.now_s() - start_s;
                if stalled_s >= max_s {
                    return Err(LocError::PositionStalled(stalled_s, max_s))
                }
            }

            clock.sleep(self.params.retry_delay_s);
        }
    }

    /// Apply a new position in world units to the pose.
    ///
    /// The heading is only updated if the vehicle has moved at least the
    /// minimum displacement since the previous position.
    pub fn update(&mut self, position: Vector2<f64>) -> Pose {
        if let Some(prev) = self.prev_position {
            let d = position - prev;
            let dist = d.norm();

            if dist >= self.params.min_displacement && dist > 0.0 {
                self.pose.heading = Some(d / dist);
            }
            else {
                trace!("Displacement {:.4} below threshold, heading unchanged", dist);
            }
        }

        self.prev_position = Some(position);
        self.pose.position = position;

        trace!(
            "Pose: position ({:.3}, {:.3}), heading {:.2} deg",
            position[0], position[1], self.pose.heading_deg()
        );

        self.pose
    }

    /// Get one fix from the source and convert it into world units.
    fn acquire(&self, source: &mut dyn PositionSource) -> Result<Vector2<f64>, LocError> {
        let fix = source.get_fix()?;

        if fix.unit != self.unit {
            return Err(LocError::PositionUnavailable(format!(
                "expected a fix in {:?} units but got {:?}", self.unit, fix.unit
            )))
        }

        if !fix.is_finite() {
            return Err(LocError::PositionUnavailable(format!(
                "fix ({}, {}) is not finite", fix.x, fix.y
            )))
        }

        let p = Vector2::new(fix.x, fix.y);

        match (self.unit, &self.calib) {
            (FixUnit::World, _) => Ok(p),
            (FixUnit::Pixel, Some(c)) => c.to_world(p).map_err(LocError::CalibrationError),
            (FixUnit::Pixel, None) => Err(LocError::MissingCalibration)
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

//! # Heading control module
//!
//! This module provides the PID controller which turns the heading error into
//! a bounded steering demand in `[-1, 1]`.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use serde::Serialize;

// Internal
pub use params::*;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Tolerance on the sample interval check, so that a loop running at exactly
/// the sample interval isn't rejected due to rounding.
const SAMPLE_INTERVAL_EPSILON_S: f64 = 1e-9;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A PID controller
#[derive(Debug, Clone)]
pub struct PidController {
    params: Params,

    /// Time of the previous evaluation
    prev_time_s: Option<f64>,

    /// Previous error
    prev_error: Option<f64>,

    /// The integral accumulation
    integral: f64,

    /// Terms of the last evaluation
    terms: PidTerms,
}

/// Contributions of each term to the last output of the controller.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq)]
pub struct PidTerms {
    pub p: f64,
    pub i: f64,
    pub d: f64,
    pub output: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Result of asking the controller for a new output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PidOutput {
    /// The controller's output, in `[-1, 1]`
    Ready(f64),

    /// Less than the sample interval has passed since the previous
    /// evaluation, the controller's state has not changed.
    NotReady,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PidController {

    /// Create a new controller from the parameters.
    pub fn new(params: Params) -> Self {
        Self {
            params,
            prev_time_s: None,
            prev_error: None,
            integral: 0f64,
            terms: PidTerms::default()
        }
    }

    /// Clear the integral, previous error and previous evaluation time.
    pub fn reset(&mut self) {
        self.prev_time_s = None;
        self.prev_error = None;
        self.integral = 0f64;
        self.terms = PidTerms::default();
    }

    /// Compute the controller output for the given error (in degrees) at
    /// time `now_s`.
    ///
    /// The first evaluation after a reset has no time step, so it neither
    /// accumulates the integral nor produces a derivative.
    pub fn compute(&mut self, error: f64, now_s: f64) -> PidOutput {

        // Calculate dt, and gate on the sample interval
        let dt = match self.prev_time_s {
            Some(t0) => {
                let dt = now_s - t0;
                if dt + SAMPLE_INTERVAL_EPSILON_S < self.params.sample_interval_s {
                    return PidOutput::NotReady
                }
                Some(dt)
            },
            None => None
        };

        let p = self.params.k_p * error;

        let d = match (dt, self.prev_error) {
            (Some(t), Some(e)) if t > 0.0 => self.params.k_d * (error - e) / t,
            _ => 0f64
        };

        // Accumulate the integral term
        let mut integral = self.integral + match dt {
            Some(t) => error * t,
            None => 0f64
        };

        // Don't grow the integral if that would push further into saturation
        if self.params.conditional_integration && integral != self.integral {
            let raw = p + self.params.k_i * integral + d;
            if raw.abs() > 1.0 && error * raw > 0.0 {
                integral = self.integral;
            }
        }

        // Limit the contribution of the integral
        if let Some(lim) = self.params.integral_limit {
            if self.params.k_i != 0.0 {
                let max = lim.abs() / self.params.k_i.abs();
                integral = util::maths::clamp(&integral, &-max, &max);
            }
        }

        let i = self.params.k_i * integral;
        let output = util::maths::clamp(&(p + i + d), &-1.0, &1.0);

        // Remember the state for the next evaluation
        self.integral = integral;
        self.prev_error = Some(error);
        self.prev_time_s = Some(now_s);
        self.terms = PidTerms { p, i, d, output };

        trace!(
            "PID: error {:.3}, P {:.4}, I {:.4}, D {:.4}, out {:.4}",
            error, p, i, d, output
        );

        PidOutput::Ready(output)
    }

    /// The integral accumulation.
    pub fn integral(&self) -> f64 {
        self.integral
    }

    /// The error passed into the previous evaluation.
    pub fn prev_error(&self) -> Option<f64> {
        self.prev_error
    }

    /// Terms of the last evaluation, all zero after a reset.
    pub fn terms(&self) -> PidTerms {
        self.terms
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn params(k_p: f64, k_i: f64, k_d: f64) -> Params {
        Params {
            k_p,
            k_i,
            k_d,
            sample_interval_s: 0.1,
            conditional_integration: false,
            integral_limit: None,
        }
    }

    #[test]
    fn test_first_sample() {
        let mut pid = PidController::new(params(0.5, 0.01, 0.1));

        // No dt so no integral or derivative, P is saturated
        assert_eq!(pid.compute(10.0, 5.0), PidOutput::Ready(1.0));
        assert_eq!(pid.integral(), 0.0);
        assert_eq!(pid.terms().d, 0.0);
        assert_eq!(pid.terms().p, 5.0);
    }

    #[test]
    fn test_not_ready_within_interval() {
        let mut pid = PidController::new(params(0.01, 0.01, 0.0));

        pid.compute(10.0, 0.0);
        pid.compute(20.0, 0.1);
        let integral = pid.integral();
        let prev = pid.prev_error();
        let terms = pid.terms();

        assert_eq!(pid.compute(-30.0, 0.15), PidOutput::NotReady);
        assert_eq!(pid.compute(-30.0, 0.19), PidOutput::NotReady);

        assert_eq!(pid.integral(), integral);
        assert_eq!(pid.prev_error(), prev);
        assert_eq!(pid.terms(), terms);

        // The interval is measured from the last successful evaluation
        assert!(matches!(pid.compute(-30.0, 0.2), PidOutput::Ready(_)));
        assert_eq!(pid.prev_error(), Some(-30.0));
    }

    #[test]
    fn test_interval_epsilon() {
        let mut pid = PidController::new(params(0.01, 0.0, 0.0));

        // Ticks accumulated in floating point land slightly short of 0.1
        let mut t = 0.0;
        pid.compute(1.0, t);
        for _ in 0..10 {
            t += 0.1;
            assert!(matches!(pid.compute(1.0, t), PidOutput::Ready(_)), "gated at {}", t);
        }
    }

    #[test]
    fn test_pid_terms() {
        let mut pid = PidController::new(params(0.01, 0.1, 0.02));

        pid.compute(10.0, 0.0);
        let out = pid.compute(20.0, 0.5);

        // integral = 20 * 0.5, derivative = (20 - 10) / 0.5
        let t = pid.terms();
        assert!((t.p - 0.2).abs() < 1e-12);
        assert!((t.i - 1.0).abs() < 1e-12);
        assert!((t.d - 0.4).abs() < 1e-12);
        assert_eq!(out, PidOutput::Ready(1.0));
        assert!((t.output - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_output_clamped() {
        let mut pid = PidController::new(params(0.5, 0.0, 0.0));
        assert_eq!(pid.compute(-90.0, 0.0), PidOutput::Ready(-1.0));
        assert_eq!(pid.compute(1.0, 0.1), PidOutput::Ready(0.5));
    }

    #[test]
    fn test_reset() {
        let mut pid = PidController::new(params(0.01, 0.1, 0.1));
        pid.compute(5.0, 0.0);
        pid.compute(5.0, 0.1);
        assert!(pid.integral() > 0.0);

        pid.reset();
        assert_eq!(pid.integral(), 0.0);
        assert_eq!(pid.prev_error(), None);

        // Evaluated immediately even though no time has passed
        assert!(matches!(pid.compute(5.0, 0.1), PidOutput::Ready(_)));
        assert_eq!(pid.terms().d, 0.0);
    }

    #[test]
    fn test_unbounded_integral() {
        let mut pid = PidController::new(params(0.5, 0.01, 0.0));

        pid.compute(90.0, 0.0);
        for i in 1..=10 {
            pid.compute(90.0, 0.1 * i as f64);
        }

        // Without anti-windup the integral grows while saturated
        assert!((pid.integral() - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_conditional_integration() {
        let mut p = params(0.5, 0.01, 0.0);
        p.conditional_integration = true;
        let mut pid = PidController::new(p);

        pid.compute(90.0, 0.0);
        for i in 1..=10 {
            pid.compute(90.0, 0.1 * i as f64);
        }
        assert_eq!(pid.integral(), 0.0);

        // Unsaturated errors still integrate
        pid.compute(1.0, 1.1);
        assert!((pid.integral() - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_conditional_integration_opposing() {
        let mut p = params(0.0, 1.0, 0.1);
        p.conditional_integration = true;
        let mut pid = PidController::new(p);

        // The derivative saturates the output negative while the error is
        // positive, so integrating brings the output back out of saturation
        pid.compute(30.0, 0.0);
        assert_eq!(pid.compute(10.0, 0.1), PidOutput::Ready(-1.0));
        assert!((pid.integral() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_integral_limit() {
        let mut p = params(0.0, 0.1, 0.0);
        p.integral_limit = Some(0.25);
        let mut pid = PidController::new(p);

        pid.compute(1.0, 0.0);
        for i in 1..=100 {
            pid.compute(1.0, 0.1 * i as f64);
        }

        assert!((pid.terms().i - 0.25).abs() < 1e-12);
        assert!((pid.integral() - 2.5).abs() < 1e-12);
    }
}

//! Heading control parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the heading controller
#[derive(Deserialize, Debug, Clone)]
pub struct Params {

    /// Proportional gain
    pub k_p: f64,

    /// Integral gain
    pub k_i: f64,

    /// Derivative gain
    pub k_d: f64,

    /// Minimum time between two evaluations of the controller.
    ///
    /// Units: seconds
    pub sample_interval_s: f64,

    /// If true the integral is not grown while the output is saturated in
    /// the direction of the error.
    #[serde(default = "default_conditional_integration")]
    pub conditional_integration: bool,

    /// Limit on the magnitude of the integral term's contribution to the
    /// output, unlimited if not set.
    pub integral_limit: Option<f64>,
}

fn default_conditional_integration() -> bool {
    true
}

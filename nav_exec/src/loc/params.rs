//! Localisation parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the position and heading estimator
#[derive(Deserialize, Debug, Clone)]
pub struct Params {

    /// Displacements between consecutive fixes shorter than this are treated
    /// as noise and do not update the heading.
    ///
    /// Units: inches
    pub min_displacement: f64,

    /// Time to wait between attempts to get a fix from the position source.
    ///
    /// Units: seconds
    pub retry_delay_s: f64,

    /// Maximum time the estimator will wait for a fix before giving up. If
    /// not set the estimator waits forever.
    ///
    /// Units: seconds
    pub max_stall_s: Option<f64>,

    /// Heading of the vehicle when it is placed on the map, if known. Does
    /// not need to be normalised.
    pub initial_heading: Option<[f64; 2]>,
}

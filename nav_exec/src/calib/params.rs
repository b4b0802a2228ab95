//! Parameters structure for the camera calibration

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the pixel to world calibration.
#[derive(Debug, Clone, Deserialize)]
pub struct Params {

    /// Pixel coordinates of the map corners as seen by the overhead camera,
    /// in the order top-left, top-right, bottom-left, bottom-right.
    ///
    /// Units: pixels,
    /// Frame: Camera image
    pub pixel_corners: [[f64; 2]; 4],

    /// Width of the map along its top edge.
    ///
    /// Units: inches
    pub map_width: f64,

    /// Height of the map along its left edge.
    ///
    /// Units: inches
    pub map_height: f64,
}

//! # Calibration module
//!
//! Converts positions reported by the overhead camera, in image pixels, into
//! map (world) coordinates in inches.
//!
//! The mapping is a full projective transform (homography) fitted exactly to
//! the four map corners, so perspective distortion from a camera which isn't
//! perfectly overhead is removed. The world frame has its origin at the
//! top-left corner of the map, +X along the top edge and +Y down the left
//! edge, matching the image axes.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::debug;
use nalgebra::{DMatrix, DVector, Matrix3, Vector2, Vector3};

pub use params::*;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Any three corners spanning less area than this are considered collinear.
const MIN_TRIANGLE_AREA: f64 = 1e-9;

/// Homogeneous scale below which a point is treated as lying on the line at
/// infinity.
const MIN_HOMOGENEOUS_SCALE: f64 = 1e-12;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A fitted pixel to world calibration.
///
/// Immutable once created.
#[derive(Debug, Clone)]
pub struct Calibration {
    pixel_corners: [Vector2<f64>; 4],

    world_corners: [Vector2<f64>; 4],

    /// Pixel to world homography
    h_wp: Matrix3<f64>,

    /// World to pixel homography
    h_pw: Matrix3<f64>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum CalibrationError {
    #[error("The {0} corners are degenerate (three or more are collinear or coincident)")]
    DegenerateCorners(&'static str),

    #[error("The {0} corners contain a non-finite coordinate")]
    NonFiniteCorner(&'static str),

    #[error("Invalid map dimensions ({0} x {1}), both must be positive")]
    InvalidMapDims(f64, f64),

    #[error("The calibration system is singular and cannot be solved")]
    Singular,

    #[error("The point ({0}, {1}) maps to infinity under the calibration")]
    PointAtInfinity(f64, f64),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Calibration {

    /// Fit the calibration to four corresponding corners.
    ///
    /// Both sets of corners must be given in the same winding order:
    /// top-left, top-right, bottom-left, bottom-right.
    pub fn calibrate(
        pixel_corners: [[f64; 2]; 4],
        world_corners: [[f64; 2]; 4]
    ) -> Result<Self, CalibrationError> {
        let px = to_vectors(&pixel_corners);
        let wd = to_vectors(&world_corners);

        check_corners(&px, "pixel")?;
        check_corners(&wd, "world")?;

        let h_wp = solve_homography(&px, &wd)?;
        let h_pw = h_wp.try_inverse().ok_or(CalibrationError::Singular)?;

        debug!("Calibration homography (pixel to world): {}", h_wp);

        Ok(Self {
            pixel_corners: px,
            world_corners: wd,
            h_wp,
            h_pw
        })
    }

    /// Fit the calibration for a rectangular map of the given size whose
    /// top-left corner is the world origin.
    pub fn from_map_dims(
        pixel_corners: [[f64; 2]; 4],
        width: f64,
        height: f64
    ) -> Result<Self, CalibrationError> {
        if !(width > 0.0 && height > 0.0) || !width.is_finite() || !height.is_finite() {
            return Err(CalibrationError::InvalidMapDims(width, height))
        }

        Self::calibrate(
            pixel_corners,
            [[0.0, 0.0], [width, 0.0], [0.0, height], [width, height]]
        )
    }

    /// Fit the calibration from the parameter file.
    pub fn from_params(params: &Params) -> Result<Self, CalibrationError> {
        Self::from_map_dims(params.pixel_corners, params.map_width, params.map_height)
    }

    /// Convert a pixel position into world units.
    pub fn to_world(&self, pixel: Vector2<f64>) -> Result<Vector2<f64>, CalibrationError> {
        project(&self.h_wp, pixel)
    }

    /// Convert a world position into pixel units.
    pub fn to_pixel(&self, world: Vector2<f64>) -> Result<Vector2<f64>, CalibrationError> {
        project(&self.h_pw, world)
    }

    pub fn pixel_corners(&self) -> &[Vector2<f64>; 4] {
        &self.pixel_corners
    }

    pub fn world_corners(&self) -> &[Vector2<f64>; 4] {
        &self.world_corners
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn to_vectors(corners: &[[f64; 2]; 4]) -> [Vector2<f64>; 4] {
    [
        Vector2::new(corners[0][0], corners[0][1]),
        Vector2::new(corners[1][0], corners[1][1]),
        Vector2::new(corners[2][0], corners[2][1]),
        Vector2::new(corners[3][0], corners[3][1]),
    ]
}

/// Reject corner sets from which no unique homography can be found.
fn check_corners(
    corners: &[Vector2<f64>; 4],
    frame: &'static str
) -> Result<(), CalibrationError> {
    if corners.iter().any(|c| !c[0].is_finite() || !c[1].is_finite()) {
        return Err(CalibrationError::NonFiniteCorner(frame))
    }

    // Coincident points also give a zero area triangle
    for &(i, j, k) in [(0, 1, 2), (0, 1, 3), (0, 2, 3), (1, 2, 3)].iter() {
        let a = corners[j] - corners[i];
        let b = corners[k] - corners[i];
        let area = 0.5 * (a[0] * b[1] - a[1] * b[0]).abs();

        if area < MIN_TRIANGLE_AREA {
            return Err(CalibrationError::DegenerateCorners(frame))
        }
    }

    Ok(())
}

/// Solve for the homography `H` (with `H[2][2] = 1`) mapping each `src`
/// point onto its `dst` point.
///
/// Each correspondence gives two linear equations in the remaining eight
/// unknowns.
fn solve_homography(
    src: &[Vector2<f64>; 4],
    dst: &[Vector2<f64>; 4]
) -> Result<Matrix3<f64>, CalibrationError> {
    let mut a = Vec::with_capacity(64);
    let mut b = Vec::with_capacity(8);

    for (s, d) in src.iter().zip(dst.iter()) {
        let (x, y) = (s[0], s[1]);
        let (u, v) = (d[0], d[1]);

        a.extend_from_slice(&[x, y, 1.0, 0.0, 0.0, 0.0, -u * x, -u * y]);
        b.push(u);
        a.extend_from_slice(&[0.0, 0.0, 0.0, x, y, 1.0, -v * x, -v * y]);
        b.push(v);
    }

    let a = DMatrix::from_row_slice(8, 8, &a);
    let b = DVector::from_vec(b);

    let h = a.lu().solve(&b).ok_or(CalibrationError::Singular)?;

    if h.iter().any(|e| !e.is_finite()) {
        return Err(CalibrationError::Singular)
    }

    Ok(Matrix3::new(
        h[0], h[1], h[2],
        h[3], h[4], h[5],
        h[6], h[7], 1.0
    ))
}

/// Apply a homography to a point, including the homogeneous divide.
fn project(h: &Matrix3<f64>, p: Vector2<f64>) -> Result<Vector2<f64>, CalibrationError> {
    let q = h * Vector3::new(p[0], p[1], 1.0);

    if !(q[2].abs() >= MIN_HOMOGENEOUS_SCALE) {
        return Err(CalibrationError::PointAtInfinity(p[0], p[1]))
    }

    Ok(Vector2::new(q[0] / q[2], q[1] / q[2]))
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    /// Corners of the map as seen by the overhead camera in the field
    const FIELD_CORNERS: [[f64; 2]; 4] = [
        [58.0, 23.0], [760.0, 23.0], [58.0, 469.0], [760.0, 469.0]
    ];

    /// A camera looking at the map at an angle
    const OBLIQUE_CORNERS: [[f64; 2]; 4] = [
        [120.0, 40.0], [690.0, 55.0], [30.0, 470.0], [780.0, 440.0]
    ];

    fn assert_near(a: Vector2<f64>, b: Vector2<f64>, tol: f64) {
        assert!((a - b).norm() < tol, "{} not within {} of {}", a, tol, b);
    }

    #[test]
    fn test_corners_map_to_world() {
        for corners in [FIELD_CORNERS, OBLIQUE_CORNERS].iter() {
            let cal = Calibration::from_map_dims(*corners, 142.0, 92.0).unwrap();

            for (p, w) in cal.pixel_corners().iter().zip(cal.world_corners().iter()) {
                assert_near(cal.to_world(*p).unwrap(), *w, 1e-3);
            }
        }
    }

    #[test]
    fn test_field_centre() {
        let cal = Calibration::from_map_dims(FIELD_CORNERS, 142.0, 92.0).unwrap();

        // An axis aligned rectangle is a pure scale and offset
        assert_near(
            cal.to_world(Vector2::new(409.0, 246.0)).unwrap(),
            Vector2::new(71.0, 46.0),
            1e-6
        );
    }

    #[test]
    fn test_oblique_is_projective() {
        let cal = Calibration::from_map_dims(OBLIQUE_CORNERS, 142.0, 92.0).unwrap();

        // Straight lines stay straight: the pixel midpoint of the top edge
        // lies on the top edge of the map
        let mid = (cal.pixel_corners()[0] + cal.pixel_corners()[1]) * 0.5;
        let w = cal.to_world(mid).unwrap();
        assert!(w[1].abs() < 1e-6);
        assert!(w[0] > 0.0 && w[0] < 142.0);

        // Inverse mapping recovers the pixel position
        let p = Vector2::new(400.0, 250.0);
        assert_near(cal.to_pixel(cal.to_world(p).unwrap()).unwrap(), p, 1e-6);
    }

    #[test]
    fn test_collinear_corners() {
        let r = Calibration::from_map_dims(
            [[0.0, 0.0], [100.0, 100.0], [200.0, 200.0], [300.0, 0.0]],
            142.0,
            92.0
        );
        assert!(matches!(r, Err(CalibrationError::DegenerateCorners("pixel"))));
    }

    #[test]
    fn test_coincident_corners() {
        let r = Calibration::from_map_dims(
            [[58.0, 23.0], [58.0, 23.0], [58.0, 469.0], [760.0, 469.0]],
            142.0,
            92.0
        );
        assert!(matches!(r, Err(CalibrationError::DegenerateCorners("pixel"))));
    }

    #[test]
    fn test_invalid_map_dims() {
        assert!(matches!(
            Calibration::from_map_dims(FIELD_CORNERS, 0.0, 92.0),
            Err(CalibrationError::InvalidMapDims(_, _))
        ));
        assert!(matches!(
            Calibration::from_map_dims(FIELD_CORNERS, 142.0, f64::NAN),
            Err(CalibrationError::InvalidMapDims(_, _))
        ));
    }

    #[test]
    fn test_point_at_infinity() {
        let cal = Calibration::from_map_dims(OBLIQUE_CORNERS, 142.0, 92.0).unwrap();

        // The vanishing line is where the bottom row of H gives w = 0
        let h = cal.h_wp;
        let x = 0.0;
        let y = -(h[(2, 0)] * x + 1.0) / h[(2, 1)];

        assert!(matches!(
            cal.to_world(Vector2::new(x, y)),
            Err(CalibrationError::PointAtInfinity(_, _))
        ));
    }
}

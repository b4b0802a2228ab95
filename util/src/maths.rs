//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Map a value from one range into another.
pub fn lin_map<T>(source_range: (T, T), target_range: (T, T), value: T) -> T
where
    T: Float
{
    target_range.0
        + ((value - source_range.0)
        * (target_range.1 - target_range.0)
        / (source_range.1 - source_range.0))
}

/// Limit a value to the range `[min, max]`.
pub fn clamp<T>(value: &T, min: &T, max: &T) -> T
where
    T: Float
{
    let mut ret = *value;

    if ret > *max {
        ret = *max
    }
    if ret < *min {
        ret = *min
    }

    ret
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
///
/// This function is taken from the std library as num is missing it.
///
/// Due to floating point round-off the result can equal `rhs.abs()` when
/// `lhs` is much smaller than `rhs` in magnitude and negative.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float
{
    let r = lhs % rhs;
    if r < T::zero() { r + rhs.abs() } else { r }
}

/// Wrap an angle in degrees into the range (-180, 180].
///
/// Non-finite inputs produce NaN.
pub fn norm_angle_deg<T>(angle: T) -> T
where
    T: Float
{
    let half: T = T::from(180.0).unwrap();
    let full: T = half + half;

    // [-180, 180], the upper bound only reachable by round-off in rem_euclid
    let a = rem_euclid(angle + half, full) - half;

    if a <= -half {
        a + full
    }
    else {
        a
    }
}

/// Angle of a 2D vector from the +X axis in degrees, in the range (-180, 180].
pub fn heading_deg<T>(x: T, y: T) -> T
where
    T: Float
{
    norm_angle_deg(y.atan2(x).to_degrees())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_lin_map() {
        assert_eq!(lin_map((0f64, 10f64), (0f64, 1f64), 5f64), 0.5);
        assert_eq!(lin_map((-1f64, 1f64), (1f64, -1f64), 0.25f64), -0.25);
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(&1.5f64, &-1.0, &1.0), 1.0);
        assert_eq!(clamp(&-3.0f64, &-1.0, &1.0), -1.0);
        assert_eq!(clamp(&0.3f64, &-1.0, &1.0), 0.3);
    }

    #[test]
    fn test_norm_angle_deg() {
        assert_eq!(norm_angle_deg(0f64), 0.0);
        assert_eq!(norm_angle_deg(180f64), 180.0);
        assert_eq!(norm_angle_deg(-180f64), 180.0);
        assert_eq!(norm_angle_deg(540f64), 180.0);
        assert_eq!(norm_angle_deg(190f64), -170.0);
        assert_eq!(norm_angle_deg(-190f64), 170.0);
        assert_eq!(norm_angle_deg(720f64), 0.0);
        assert!((norm_angle_deg(-359.5f64) - 0.5).abs() < 1e-9);
        assert!(norm_angle_deg(f64::INFINITY).is_nan());
    }

    #[test]
    fn test_norm_angle_deg_range() {
        // Sweep a wide range of inputs including awkward fractions
        let mut a = -10_000.0f64;
        while a < 10_000.0 {
            let n = norm_angle_deg(a);
            assert!(n > -180.0 && n <= 180.0, "{} normalised to {}", a, n);
            a += 7.3;
        }

        for a in [1e-20f64, -1e-20, 1e12, -1e12, 179.999_999_999, -179.999_999_999].iter() {
            let n = norm_angle_deg(*a);
            assert!(n > -180.0 && n <= 180.0, "{} normalised to {}", a, n);
        }
    }

    #[test]
    fn test_heading_deg() {
        assert_eq!(heading_deg(1f64, 0f64), 0.0);
        assert!((heading_deg(0f64, 1f64) - 90.0).abs() < 1e-12);
        assert!((heading_deg(-1f64, 0f64) - 180.0).abs() < 1e-12);
        assert!((heading_deg(1f64, -1f64) + 45.0).abs() < 1e-12);
    }
}

//! # Position Equipment Communications Module
//!
//! The position server wraps the overhead observer camera, which tracks a marker on the vehicle
//! and reports its location either in image pixels or, if the server was calibrated itself, in
//! world units.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use chrono::{serde::ts_milliseconds, DateTime, Utc};
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A single position fix of the vehicle's marker.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PosFix {
    /// UTC timestamp at which the frame containing the fix was acquired
    #[serde(with = "ts_milliseconds")]
    pub timestamp: DateTime<Utc>,

    pub x: f64,

    pub y: f64,

    /// The units of `x` and `y`
    pub unit: FixUnit,
}

// -----------------------------------------------------------------------------------------------
// ENUMS
// -----------------------------------------------------------------------------------------------

/// Units a position fix can be expressed in.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum FixUnit {
    /// Camera image pixels, requiring calibration before use
    Pixel,

    /// World units (inches), already converted by the server
    World,
}

/// Requests that can be sent to the position server
#[derive(Debug, Serialize, Deserialize, Clone)]
pub enum PosRequest {
    /// Acquire the latest position fix
    AcqFix,
}

/// Replies that can be sent by the position server
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum PosResponse {
    /// The latest fix
    Fix(PosFix),

    /// The marker was not visible in the latest frame
    NoFix,

    /// An error occured in the server
    ServerError(String),
}

// -----------------------------------------------------------------------------------------------
// IMPLS
// -----------------------------------------------------------------------------------------------

impl PosFix {
    /// Create a new fix timestamped now.
    pub fn now(x: f64, y: f64, unit: FixUnit) -> Self {
        Self {
            timestamp: Utc::now(),
            x,
            y,
            unit,
        }
    }

    /// True if both coordinates are finite.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_fix_json() {
        let fix = PosFix {
            timestamp: Utc.timestamp_millis(1_600_000_000_123),
            x: 58.0,
            y: 23.5,
            unit: FixUnit::Pixel,
        };

        let s = serde_json::to_string(&PosResponse::Fix(fix.clone())).unwrap();
        assert_eq!(
            s,
            r#"{"Fix":{"timestamp":1600000000123,"x":58.0,"y":23.5,"unit":"Pixel"}}"#
        );

        let back: PosResponse = serde_json::from_str(&s).unwrap();
        assert_eq!(back, PosResponse::Fix(fix));
    }

    #[test]
    fn test_non_finite_fix() {
        assert!(PosFix::now(1.0, 2.0, FixUnit::World).is_finite());
        assert!(!PosFix::now(f64::NAN, 2.0, FixUnit::World).is_finite());
        assert!(!PosFix::now(1.0, f64::INFINITY, FixUnit::Pixel).is_finite());
    }
}

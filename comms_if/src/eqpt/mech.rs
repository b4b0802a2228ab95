//! # Mechanisms Equipment Commands
//!
//! The vehicle has two driven wheels, each commanded with a normalised throttle in `[-1, 1]`.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Demands that are sent from the MechClient to the MechServer
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct WheelDems {
    /// Throttle of the left wheel, positive drives forward.
    pub left: f64,

    /// Throttle of the right wheel, positive drives forward.
    pub right: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// IDs of the driven wheels
#[derive(Serialize, Deserialize, Debug, Hash, Eq, PartialEq, Copy, Clone)]
pub enum WheelId {
    Left,
    Right,
}

/// Response from the mechanisms server based on the demands sent by the client.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum MechDemsResponse {
    /// Demands were valid and will be executed
    DemsOk,

    /// Demands were invalid and have been rejected
    DemsInvalid,

    /// Equipment is invalid so demands cannot be actuated
    EqptInvalid,
}

// -----------------------------------------------------------------------------------------------
// IMPLS
// -----------------------------------------------------------------------------------------------

impl WheelDems {
    /// Demands which bring both wheels to rest.
    pub fn stop() -> Self {
        Self::default()
    }

    pub fn get(&self, id: WheelId) -> f64 {
        match id {
            WheelId::Left => self.left,
            WheelId::Right => self.right,
        }
    }

    pub fn set(&mut self, id: WheelId, throttle: f64) {
        match id {
            WheelId::Left => self.left = throttle,
            WheelId::Right => self.right = throttle,
        }
    }

    /// True if both throttles are exactly zero.
    pub fn is_stop(&self) -> bool {
        self.left == 0.0 && self.right == 0.0
    }

    /// True if both throttles are finite and within `[-1, 1]`.
    pub fn is_valid(&self) -> bool {
        [self.left, self.right]
            .iter()
            .all(|t| t.is_finite() && t.abs() <= 1.0)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_wheel_dems_validity() {
        assert!(WheelDems::stop().is_valid());
        assert!(WheelDems::stop().is_stop());
        assert!(WheelDems { left: 1.0, right: -1.0 }.is_valid());
        assert!(!WheelDems { left: 1.01, right: 0.0 }.is_valid());
        assert!(!WheelDems { left: 0.0, right: f64::NAN }.is_valid());
    }

    #[test]
    fn test_wheel_dems_by_id() {
        let mut d = WheelDems::stop();
        d.set(WheelId::Right, 0.25);
        assert_eq!(d.get(WheelId::Right), 0.25);
        assert_eq!(d.get(WheelId::Left), 0.0);
        assert!(!d.is_stop());
    }

    #[test]
    fn test_dems_json() {
        let s = serde_json::to_string(&WheelDems { left: 0.5, right: -0.5 }).unwrap();
        assert_eq!(s, r#"{"left":0.5,"right":-0.5}"#);

        let r: MechDemsResponse = serde_json::from_str(r#""EqptInvalid""#).unwrap();
        assert_eq!(r, MechDemsResponse::EqptInvalid);
    }
}

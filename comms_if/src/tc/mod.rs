//! # Telecommand module
//!
//! This module provides the navigation telecommands, i.e. instructions sent to the vehicle by the
//! operator, and the responses to them.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A navigation telecommand.
///
/// Waypoints are `[x, y]` pairs in world units (inches).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum NavTc {
    /// Begin navigating through the given waypoints. Only valid while idle.
    Start { waypoints: Vec<[f64; 2]> },

    /// Replace the waypoint list without starting. Only valid while idle.
    SetWaypoints { waypoints: Vec<[f64; 2]> },

    /// Stop the vehicle and end navigation.
    Stop,
}

/// Response to a telecommand.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum TcResponse {
    /// The telecommand was accepted
    Ok,

    /// The telecommand was valid but cannot be executed, with the reason
    CannotExecute(String),

    /// The telecommand could not be parsed
    Invalid,
}

//! # Navigation Executable Parameters
//!
//! This module provide parameters for the navigation executable.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::eqpt::pos::FixUnit;
use serde::Deserialize;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct NavExecParams {
    /// Where position fixes come from
    pub pos_source: PosSourceKind,

    /// Units the position source reports fixes in
    pub fix_unit: FixUnit,

    /// Write the navigation status report to the session archive each cycle
    pub archive_enabled: bool,

    /// Begin navigating the waypoints in `nav_ctrl.toml` as soon as the executable starts
    pub start_on_launch: bool,

    /// Accept telecommands on the telecommand endpoint
    pub tc_enabled: bool,

    /// Maximum time to wait for a reply from the position server.
    ///
    /// Units: milliseconds
    pub pos_recv_timeout_ms: i32,

    /// Maximum time to wait for a reply from the mechanisms server.
    ///
    /// Units: milliseconds
    pub mech_recv_timeout_ms: i32,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Sources of position fixes and destinations for wheel demands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum PosSourceKind {
    /// The position and mechanisms servers, over the network
    Remote,

    /// The built in kinematic simulation
    Sim,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_load() {
        let p: NavExecParams = util::params::from_str(
            r#"
            pos_source = "Sim"
            fix_unit = "Pixel"
            archive_enabled = true
            start_on_launch = false
            tc_enabled = true
            pos_recv_timeout_ms = 200
            mech_recv_timeout_ms = 50
            "#,
        )
        .unwrap();

        assert_eq!(p.pos_source, PosSourceKind::Sim);
        assert_eq!(p.fix_unit, FixUnit::Pixel);
        assert_eq!(p.pos_recv_timeout_ms, 200);
    }
}

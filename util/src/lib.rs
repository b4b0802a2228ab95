//! Utility library for the waypoint navigation software

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

/// CSV archives of per-cycle records
pub mod archive;

pub mod host;

/// Console and session log file
pub mod logger;

/// Clamping, mapping and angle helpers
pub mod maths;

/// TOML parameter files
pub mod params;

/// Session directories and the session epoch
pub mod session;

pub mod time;

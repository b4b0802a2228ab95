//! # Navigation library.
//!
//! This library allows other crates in the workspace to access items defined inside the
//! navigation crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Calibration - maps camera pixels onto the world map
pub mod calib;

/// Clock - time source for the control loop
pub mod clock;

/// Drive control module - converts manoeuvres into individual wheel throttles
pub mod drive_ctrl;

/// Heading control module - PID controller on the heading error
pub mod head_ctrl;

/// Localisation module - provides the vehicle with an idea of where it is and which way it faces
pub mod loc;

/// Mechanisms client - sends wheel demands to the mechanisms server
pub mod mech_client;

/// Navigation control module - drives the vehicle through the waypoints
pub mod nav_ctrl;

/// Executable parameters
pub mod params;

/// Position client - requests marker fixes from the position server
pub mod pos_client;

/// Simulation - kinematic model of the vehicle
pub mod sim;

/// Telecommand client - recieves telecommands from the ground
pub mod tc_client;

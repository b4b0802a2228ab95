//! # Communications interface crate.
//!
//! Provides all common communications interfaces for the navigation software: the messages sent
//! to and from the position and mechanisms servers, navigation telecommands, and the socket
//! helpers used to carry them.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Navigation telecommands
pub mod tc;

/// Command and response definitions for equipment (position server and mechanisms)
pub mod eqpt;

/// Network module
pub mod net;

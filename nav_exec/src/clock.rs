//! # Clock
//!
//! The time source used by the control loop. Real executions use the session
//! clock, the simulation supplies its own virtual time.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::thread;
use std::time::{Duration, Instant};

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A monotonic time source which can also block the caller.
pub trait Clock {
    /// Current time in seconds.
    fn now_s(&self) -> f64;

    /// Block for the given number of seconds. Non-positive durations return
    /// immediately.
    fn sleep(&mut self, duration_s: f64);
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Wall clock measured from the session epoch.
///
/// If no session has been started time is measured from the creation of the
/// clock instead.
#[derive(Debug, Clone)]
pub struct SessionClock {
    created: Instant,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SessionClock {
    pub fn new() -> Self {
        Self {
            created: Instant::now()
        }
    }
}

impl Default for SessionClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SessionClock {
    fn now_s(&self) -> f64 {
        util::session::elapsed_seconds()
            .unwrap_or_else(|| self.created.elapsed().as_secs_f64())
    }

    fn sleep(&mut self, duration_s: f64) {
        if duration_s > 0.0 && duration_s.is_finite() {
            thread::sleep(Duration::from_secs_f64(duration_s));
        }
    }
}

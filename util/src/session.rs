//! Session management
//!
//! A session is one execution of an executable. Each session gets its own
//! directory holding the log file and the CSV archives, and fixes the epoch
//! against which all elapsed times are measured.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use chrono::{DateTime, Utc};
use conquer_once::OnceCell;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

// Internal imports
use crate::time;

// ---------------------------------------------------------------------------
// STATICS
// ---------------------------------------------------------------------------

static SESSION_EPOCH: OnceCell<DateTime<Utc>> = OnceCell::uninit();

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Format of the timestamp in session directory names, see
/// https://docs.rs/chrono/0.4/chrono/format/strftime/index.html.
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The directories and files belonging to one session
#[derive(Clone, Debug)]
pub struct Session {
    /// The root directory for this session
    pub session_root: PathBuf,

    /// The root directory for this session's archives
    pub arch_root: PathBuf,

    /// The path to the session's log file
    pub log_file_path: PathBuf,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("The software root environment variable (NAV_SW_ROOT) is not set")]
    SwRootNotSet,

    #[error("Cannot create the session directory: {0}")]
    CannotCreateDir(std::io::Error),

    #[error(
        "A session has already been started in this process \
         (conquer_once error: {0})"
    )]
    CannotInitEpoch(conquer_once::TryInitError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Session {
    /// Start the session for this process.
    ///
    /// Sets the session epoch and creates the directory
    /// `$NAV_SW_ROOT/{sessions_dir}/{exec_name}_{timestamp}`. Only one session
    /// can be started per process.
    pub fn new(exec_name: &str, sessions_dir: &str) -> Result<Self, SessionError> {
        let root = crate::host::get_sw_root()
            .map_err(|_| SessionError::SwRootNotSet)?;

        let epoch = Utc::now();
        SESSION_EPOCH
            .try_init_once(|| epoch)
            .map_err(SessionError::CannotInitEpoch)?;

        Self::create_in(&root.join(sessions_dir), exec_name, &epoch)
    }

    /// Create the session directories inside `dir` without touching the
    /// process epoch.
    ///
    /// If a session directory with the same timestamp already exists a
    /// numeric suffix is added.
    pub fn create_in(
        dir: &Path,
        exec_name: &str,
        epoch: &DateTime<Utc>
    ) -> Result<Self, SessionError> {
        let base = format!("{}_{}", exec_name, epoch.format(TIMESTAMP_FORMAT));

        let mut session_root = dir.join(&base);
        let mut n = 1;
        while session_root.exists() {
            session_root = dir.join(format!("{}_{}", base, n));
            n += 1;
        }

        let arch_root = session_root.join("arch");
        fs::create_dir_all(&arch_root).map_err(SessionError::CannotCreateDir)?;

        Ok(Session {
            log_file_path: session_root.join(format!("{}.log", exec_name)),
            session_root,
            arch_root,
        })
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Seconds elapsed since the session epoch, or `None` if no session has been
/// started.
pub fn elapsed_seconds() -> Option<f64> {
    SESSION_EPOCH.get().map(|e| {
        time::duration_to_seconds(Utc::now() - *e).unwrap_or(std::f64::NAN)
    })
}

/// The session epoch, or `None` if no session has been started.
pub fn epoch() -> Option<&'static DateTime<Utc>> {
    SESSION_EPOCH.get()
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_create_in() {
        let dir = std::env::temp_dir()
            .join(format!("util_session_test_{}", std::process::id()));
        let epoch = Utc::now();

        let a = Session::create_in(&dir, "nav_exec", &epoch).unwrap();
        let b = Session::create_in(&dir, "nav_exec", &epoch).unwrap();

        assert!(a.arch_root.is_dir());
        assert!(a.log_file_path.starts_with(&a.session_root));
        assert_eq!(a.arch_root, a.session_root.join("arch"));

        // Same timestamp, different directories
        assert_ne!(a.session_root, b.session_root);
        assert!(b.session_root.is_dir());

        fs::remove_dir_all(&dir).ok();
    }
}

//! Logger setup
//!
//! Records are written to stdout and to the session's log file, prefixed
//! with the seconds elapsed since the session epoch. The console is limited to
//! `DEBUG` so per-tick `TRACE` records only end up in the file.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use colored::{ColoredString, Colorize};
use log::{info, Level, Record};
use std::fmt;
use thiserror::Error;

// Internal imports
use crate::session::{self, Session};

// Re-exports
pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors associated with initialising the logger.
#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("The minimum log level must include `INFO`, found `{0}`")]
    InvalidMinLogLevel(LevelFilter),

    #[error("Error initialising the log file: {0}")]
    LogFileInitError(std::io::Error),

    #[error("An error occured while setting up the logger: {0}")]
    FernInitError(log::SetLoggerError)
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Initialise the logger for this execution.
///
/// `min_level` is the level written to the log file and must be `INFO` or
/// more verbose. Must only be called once.
pub fn logger_init(
    min_level: LevelFilter,
    session: &Session
) -> Result<(), LoggerInitError> {

    if min_level < LevelFilter::Info {
        return Err(LoggerInitError::InvalidMinLogLevel(min_level))
    }

    let log_file = fern::log_file(&session.log_file_path)
        .map_err(LoggerInitError::LogFileInitError)?;

    let console = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!("{}", format_record(record, message, true)))
        })
        .level(min_level.min(LevelFilter::Debug))
        .chain(std::io::stdout());

    let file = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!("{}", format_record(record, message, false)))
        })
        .chain(log_file);

    fern::Dispatch::new()
        .level(min_level)
        .level_for("zmq", LevelFilter::Info)
        .chain(console)
        .chain(file)
        .apply()
        .map_err(LoggerInitError::FernInitError)?;

    info!("Logging initialised");
    if let Some(e) = session::epoch() {
        info!("    Session epoch: {}", e);
    }
    info!("    Log level: {:?}", min_level);
    info!("    Log file path: {:?}", session.log_file_path);

    Ok(())
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Format a record as `[elapsed LVL] message`, with the target included for
/// debug and trace records.
fn format_record(record: &Record, message: &fmt::Arguments, colour: bool) -> String {
    let time_s = session::elapsed_seconds().unwrap_or(0.0);

    let level = match colour {
        true => level_tag(record.level()),
        false => level_tag(record.level()).clear()
    };

    if record.level() > Level::Info {
        format!("[{:10.6} {}] {}: {}", time_s, level, record.target(), message)
    }
    else {
        format!("[{:10.6} {}] {}", time_s, level, message)
    }
}

fn level_tag(level: Level) -> ColoredString {
    match level {
        Level::Trace => "TRC".dimmed().italic(),
        Level::Debug => "DBG".dimmed(),
        Level::Info  => "INF".normal(),
        Level::Warn  => "WRN".yellow(),
        Level::Error => "ERR".red().bold()
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_format_record() {
        let s = format_record(
            &Record::builder()
                .level(Level::Debug)
                .target("nav_ctrl")
                .args(format_args!("aligned"))
                .build(),
            &format_args!("aligned"),
            false
        );
        assert!(s.ends_with(" DBG] nav_ctrl: aligned"), "{}", s);

        let s = format_record(
            &Record::builder()
                .level(Level::Warn)
                .target("nav_ctrl")
                .args(format_args!("stalled"))
                .build(),
            &format_args!("stalled"),
            false
        );
        assert!(s.ends_with(" WRN] stalled"), "{}", s);
    }
}

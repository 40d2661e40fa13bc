//! Logger setup for the executables
//!
//! Every line is stamped with the wall clock seconds since the session epoch.
//! Once the executable publishes the simulated controller time through
//! [`set_sim_time_ms`] the line also carries that time, so log lines can be
//! matched against rows of the tick archive.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use colored::{ColoredString, Colorize};
use log::{self, info};
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

// Internal imports
use crate::session;

// Re-exports
pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// STATICS
// ---------------------------------------------------------------------------

/// Marker for "no simulated time published yet".
const NO_SIM_TIME: u64 = u64::MAX;

static SIM_TIME_MS: AtomicU64 = AtomicU64::new(NO_SIM_TIME);

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors associated with initialising the logger.
#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("Expected a log level of at least `INFO`, found `{0}`")]
    InvalidMinLogLevel(log::LevelFilter),

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
/// Lines go to the session's log file at `min_level`. The terminal gets at
/// most debug lines, per-tick trace output only goes to the file.
///
/// # Notes
///
/// - `min_level` must be at least `log::Level::Info`.
/// - Only the first call can succeed, later calls return `FernInitError`.
pub fn logger_init(
    min_level: self::LevelFilter,
    session: &session::Session
) -> Result<(), LoggerInitError> {

    if min_level < log::Level::Info {
        return Err(LoggerInitError::InvalidMinLogLevel(min_level))
    }

    let log_file = fern::log_file(session.log_file_path.clone())
        .map_err(LoggerInitError::LogFileInitError)?;

    fern::Dispatch::new()
        .format(|out, message, record| {
            let stamp = format_stamp(
                session::get_elapsed_seconds(),
                SIM_TIME_MS.load(Ordering::Relaxed)
            );

            // Debug and trace lines name the module they came from
            if record.level() > log::Level::Info {
                out.finish(format_args!(
                    "[{} {}] {}: {}",
                    stamp,
                    level_to_str(record.level()),
                    record.target(),
                    message
                ))
            }
            else {
                out.finish(format_args!(
                    "[{} {}] {}",
                    stamp,
                    level_to_str(record.level()),
                    message
                ))
            }
        })
        .level(min_level)
        .chain(fern::Dispatch::new()
            .level(min_level.min(LevelFilter::Debug))
            .chain(std::io::stdout()))
        .chain(log_file)
        .apply()
        .map_err(LoggerInitError::FernInitError)?;

    info!("Logging initialised");
    info!("    Session epoch: {}", session::get_epoch());
    info!("    Log level: {:?}", min_level);
    info!("    Log file path: {:?}", session.log_file_path);

    Ok(())
}

/// Publish the current simulated controller time to be shown on log lines.
pub fn set_sim_time_ms(time_ms: u32) {
    SIM_TIME_MS.store(time_ms as u64, Ordering::Relaxed);
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Build the time stamp of a line.
fn format_stamp(elapsed_s: f64, sim_time_ms: u64) -> String {
    if sim_time_ms == NO_SIM_TIME {
        format!("{:10.6}", elapsed_s)
    }
    else {
        format!("{:10.6} {:>8}ms", elapsed_s, sim_time_ms)
    }
}

/// Get the string representation of a log level
fn level_to_str(level: log::Level) -> ColoredString {
    match level {
        log::Level::Trace => "TRC".dimmed().italic(),
        log::Level::Debug => "DBG".dimmed(),
        log::Level::Info  => "INF".normal(),
        log::Level::Warn  => "WRN".yellow(),
        log::Level::Error => "ERR".red().bold()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_format_stamp() {
        assert_eq!(format_stamp(1.5, NO_SIM_TIME), "  1.500000");
        assert_eq!(format_stamp(1.5, 2350), "  1.500000     2350ms");
    }
}

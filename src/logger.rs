//! Kernel Log Backend
//!
//! Routes the `log` facade to the serial console. Until [`init`] runs,
//! log calls are discarded.

use log::{Level, LevelFilter, Metadata, Record, SetLoggerError};

use crate::kprintln;

struct SerialLogger;

static LOGGER: SerialLogger = SerialLogger;

impl log::Log for SerialLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let level = match record.level() {
            Level::Error => "ERROR",
            Level::Warn => "WARN",
            Level::Info => "INFO",
            Level::Debug => "DEBUG",
            Level::Trace => "TRACE",
        };
        kprintln!("[{}] {}", level, record.args());
    }

    fn flush(&self) {}
}

/// Install the serial logger with the given verbosity.
///
/// Fails if a logger is already installed.
pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_logger(&LOGGER)?;
    log::set_max_level(level);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logger_installs_once() {
        assert!(init(LevelFilter::Debug).is_ok());
        assert!(init(LevelFilter::Trace).is_err());
        assert_eq!(log::max_level(), LevelFilter::Debug);
        // The serial port is not initialized on the host, so this is dropped.
        log::info!("logger installed");
    }
}

/// Nova3D Engine facade - global logger management
///
/// The shader pipeline logs through a single global logger so that the
/// engine_* macros work from any crate. This module provides thread-safe
/// static storage for that logger; all other engine subsystems (device,
/// context, resource management) live outside this workspace.

use std::sync::{OnceLock, RwLock};
use std::time::SystemTime;
use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};

/// Global logger (initialized with DefaultLogger on first use)
static LOGGER: OnceLock<RwLock<Box<dyn Logger>>> = OnceLock::new();

/// Engine facade
///
/// Holds no state of its own; routes the engine_* logging macros to the
/// globally installed [`Logger`].
pub struct Engine;

impl Engine {
    /// Set a custom logger
    ///
    /// Replace the default logger with a custom implementation
    /// (file logger, capture logger for tests, etc.)
    ///
    /// # Example
    ///
    /// ```no_run
    /// use nova_3d_engine::nova3d::{Engine};
    /// use nova_3d_engine::nova3d::log::{Logger, LogEntry};
    ///
    /// struct FileLogger;
    /// impl Logger for FileLogger {
    ///     fn log(&self, entry: &LogEntry) {
    ///         // Write to file...
    ///     }
    /// }
    ///
    /// Engine::set_logger(FileLogger);
    /// ```
    pub fn set_logger<L: Logger + 'static>(logger: L) {
        let logger_lock = LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)));
        if let Ok(mut lock) = logger_lock.write() {
            *lock = Box::new(logger);
        }
    }

    /// Reset logger to default (DefaultLogger)
    pub fn reset_logger() {
        let logger_lock = LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)));
        if let Ok(mut lock) = logger_lock.write() {
            *lock = Box::new(DefaultLogger);
        }
    }

    /// Internal logging method (for simple logs without file:line)
    ///
    /// Used by macros like engine_info!, engine_warn!, etc.
    pub fn log(severity: LogSeverity, source: &str, message: String) {
        let logger_lock = LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)));
        if let Ok(lock) = logger_lock.read() {
            lock.log(&LogEntry {
                severity,
                timestamp: SystemTime::now(),
                source: source.to_string(),
                message,
                file: None,
                line: None,
            });
        }
    }

    /// Internal logging method with file:line information (for ERROR logs)
    ///
    /// Used by the engine_error!/engine_err! macros to include source location.
    pub fn log_detailed(
        severity: LogSeverity,
        source: &str,
        message: String,
        file: &'static str,
        line: u32,
    ) {
        let logger_lock = LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)));
        if let Ok(lock) = logger_lock.read() {
            lock.log(&LogEntry {
                severity,
                timestamp: SystemTime::now(),
                source: source.to_string(),
                message,
                file: Some(file),
                line: Some(line),
            });
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;

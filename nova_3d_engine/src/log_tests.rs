//! Unit tests for the logging types and macros
//!
//! IMPORTANT: the macros log through the global logger, so macro tests are
//! marked #[serial] to avoid clobbering each other's installed logger.

use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
use crate::nova3d::{Engine, Error};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;
use serial_test::serial;

// ============================================================================
// TEST HELPERS
// ============================================================================

struct CaptureLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl CaptureLogger {
    fn new() -> (Self, Arc<Mutex<Vec<LogEntry>>>) {
        let entries = Arc::new(Mutex::new(Vec::new()));
        (Self { entries: entries.clone() }, entries)
    }
}

impl Logger for CaptureLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push(entry.clone());
    }
}

// ============================================================================
// SEVERITY AND ENTRY TESTS
// ============================================================================

#[test]
fn test_severity_ordering() {
    assert!(LogSeverity::Trace < LogSeverity::Debug);
    assert!(LogSeverity::Debug < LogSeverity::Info);
    assert!(LogSeverity::Info < LogSeverity::Warn);
    assert!(LogSeverity::Warn < LogSeverity::Error);
}

#[test]
fn test_log_entry_clone_preserves_fields() {
    let entry = LogEntry {
        severity: LogSeverity::Warn,
        timestamp: SystemTime::now(),
        source: "nova3d::gles::ShaderObject".to_string(),
        message: "program binary rejected".to_string(),
        file: Some("gles_shader_object.rs"),
        line: Some(10),
    };
    let cloned = entry.clone();
    assert_eq!(cloned.severity, LogSeverity::Warn);
    assert_eq!(cloned.source, entry.source);
    assert_eq!(cloned.message, entry.message);
    assert_eq!(cloned.file, Some("gles_shader_object.rs"));
    assert_eq!(cloned.line, Some(10));
}

#[test]
fn test_default_logger_does_not_panic() {
    let logger = DefaultLogger;
    logger.log(&LogEntry {
        severity: LogSeverity::Info,
        timestamp: SystemTime::now(),
        source: "nova3d::test".to_string(),
        message: "plain message".to_string(),
        file: None,
        line: None,
    });
    logger.log(&LogEntry {
        severity: LogSeverity::Error,
        timestamp: SystemTime::now(),
        source: "nova3d::test".to_string(),
        message: "detailed message".to_string(),
        file: Some("log_tests.rs"),
        line: Some(1),
    });
}

// ============================================================================
// MACRO TESTS
// ============================================================================

#[test]
#[serial]
fn test_logging_macros_reach_installed_logger() {
    let (logger, entries) = CaptureLogger::new();
    Engine::set_logger(logger);

    crate::engine_trace!("nova3d::test", "t {}", 1);
    crate::engine_debug!("nova3d::test", "d {}", 2);
    crate::engine_info!("nova3d::test", "i {}", 3);
    crate::engine_warn!("nova3d::test", "w {}", 4);
    crate::engine_error!("nova3d::test", "e {}", 5);

    let entries = entries.lock().unwrap();
    assert_eq!(entries.len(), 5);
    assert_eq!(entries[0].severity, LogSeverity::Trace);
    assert_eq!(entries[4].severity, LogSeverity::Error);
    assert_eq!(entries[4].message, "e 5");
    // Only the error macro carries file:line
    assert!(entries[0].file.is_none());
    assert!(entries[4].file.is_some());

    Engine::reset_logger();
}

#[test]
#[serial]
fn test_engine_err_logs_and_builds_error() {
    let (logger, entries) = CaptureLogger::new();
    Engine::set_logger(logger);

    let err: Error = crate::engine_err!("nova3d::test", "missing {}", "cbuffer");
    match err {
        Error::BackendError(msg) => assert_eq!(msg, "missing cbuffer"),
        other => panic!("Expected BackendError, got {:?}", other),
    }

    let entries = entries.lock().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].severity, LogSeverity::Error);
    assert_eq!(entries[0].message, "missing cbuffer");

    Engine::reset_logger();
}

#[test]
#[serial]
fn test_engine_bail_early_returns() {
    fn failing() -> crate::nova3d::Result<()> {
        crate::engine_bail!("nova3d::test", "bail {}", 7);
    }

    let (logger, entries) = CaptureLogger::new();
    Engine::set_logger(logger);

    match failing() {
        Err(Error::BackendError(msg)) => assert_eq!(msg, "bail 7"),
        other => panic!("Expected BackendError, got {:?}", other),
    }
    assert_eq!(entries.lock().unwrap().len(), 1);

    Engine::reset_logger();
}

//! Integration tests for Engine logging system
//!
//! These tests verify that index buffer and soft device failures reach the
//! installed logger with the right severity. No GPU required.
//!
//! Run with: cargo test --test logging_integration_tests


use index_buffer::log::{DefaultLogger, LogEntry, LogSeverity, Logger};
use index_buffer::{Engine, IndexBuffer};
use index_buffer_device_soft::DeviceProfile;
use serial_test::serial;
use soft_test_utils::{filled_buffer, soft_context};
use std::sync::{Arc, Mutex};

// ============================================================================
// TEST LOGGER IMPLEMENTATION
// ============================================================================

/// Test logger that captures log entries for verification
struct TestLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl TestLogger {
    fn new() -> (Self, Arc<Mutex<Vec<LogEntry>>>) {
        let entries = Arc::new(Mutex::new(Vec::new()));
        (Self { entries: entries.clone() }, entries)
    }
}

impl Logger for TestLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push(entry.clone());
    }
}

/// Entries at `severity` or above
fn at_least(entries: &Arc<Mutex<Vec<LogEntry>>>, severity: LogSeverity) -> Vec<LogEntry> {
    entries.lock().unwrap().iter().filter(|entry| entry.severity >= severity).cloned().collect()
}

// ============================================================================
// LOGGING TESTS
// ============================================================================

#[test]
#[serial]
fn test_integration_custom_logger() {
    let (test_logger, entries) = TestLogger::new();
    Engine::set_logger(test_logger);

    Engine::log(LogSeverity::Info, "test::module", "Test info message".to_string());
    Engine::log(LogSeverity::Warn, "test::module", "Test warning message".to_string());

    let captured = entries.lock().unwrap().clone();
    assert_eq!(captured.len(), 2);
    assert_eq!(captured[0].severity, LogSeverity::Info);
    assert_eq!(captured[0].source, "test::module");
    assert_eq!(captured[1].message, "Test warning message");

    Engine::reset_logger();
}

#[test]
#[serial]
fn test_integration_successful_operations_log_no_warnings() {
    let (test_logger, entries) = TestLogger::new();
    Engine::set_logger(test_logger);

    let (device, context) = soft_context(DeviceProfile::Desktop);
    let source = filled_buffer(&context, &[1, 2, 3]);
    let mut destination = filled_buffer(&context, &[0, 0, 0]);
    destination.copy_from(&source).unwrap();
    IndexBuffer::bind(&context, Some(&destination));
    device.draw_indexed(3).unwrap();

    assert!(at_least(&entries, LogSeverity::Warn).is_empty());

    Engine::reset_logger();
}

#[test]
#[serial]
fn test_integration_precondition_failures_are_warnings() {
    let (test_logger, entries) = TestLogger::new();
    Engine::set_logger(test_logger);

    let (_device, context) = soft_context(DeviceProfile::Desktop);
    let mut buffer = filled_buffer(&context, &[1, 2]);
    assert!(buffer.update_range(&[1, 2, 3], 3, 1).is_err());

    let captured = at_least(&entries, LogSeverity::Warn);
    assert_eq!(captured.len(), 1);
    assert_eq!(captured[0].severity, LogSeverity::Warn);
    assert_eq!(captured[0].source, "index_buffer::IndexBuffer");
    assert!(captured[0].message.contains("exceeds capacity"));

    Engine::reset_logger();
}

#[test]
#[serial]
fn test_integration_unsupported_copy_is_warning() {
    let (test_logger, entries) = TestLogger::new();
    Engine::set_logger(test_logger);

    let (_device, context) = soft_context(DeviceProfile::Restricted);
    let source = filled_buffer(&context, &[1]);
    let mut destination = filled_buffer(&context, &[0]);
    assert!(destination.copy_from(&source).is_err());

    let captured = at_least(&entries, LogSeverity::Warn);
    assert_eq!(captured.len(), 1);
    assert!(captured[0].message.starts_with("Unsupported platform"));

    Engine::reset_logger();
}

#[test]
#[serial]
fn test_integration_device_errors_carry_location() {
    let (test_logger, entries) = TestLogger::new();
    Engine::set_logger(test_logger);

    let (device, _context) = soft_context(DeviceProfile::Desktop);
    assert!(device.draw_indexed(1).is_err());

    let captured = at_least(&entries, LogSeverity::Error);
    assert_eq!(captured.len(), 1);
    assert_eq!(captured[0].source, "index_buffer_device_soft::SoftDevice");
    assert!(captured[0].file.is_some());
    assert!(captured[0].line.is_some());

    Engine::reset_logger();
}

#[test]
#[serial]
fn test_integration_default_logger_formats_entries() {
    Engine::reset_logger();

    let entry = LogEntry {
        severity: LogSeverity::Error,
        timestamp: std::time::SystemTime::now(),
        source: "test::module".to_string(),
        message: "Formatted".to_string(),
        file: Some("src/lib.rs"),
        line: Some(7),
    };

    let line = DefaultLogger::format_plain(&entry);
    assert!(line.contains("test::module"));
    assert!(line.contains("Formatted"));
    assert!(line.contains("src/lib.rs:7"));
}

//! Diagnostics sink for the index buffer crate
//!
//! Failures are never fatal: every operation returns its error to the caller
//! and also reports it here, fire-and-forget. Caller misuse and capability
//! gating arrive as `Warn`; device failures arrive as `Error` and carry the
//! file and line that raised them. Install a `Logger` through
//! `Engine::set_logger` to route these reports elsewhere; without one, the
//! `DefaultLogger` prints them to the console.

use chrono::{DateTime, Local};
use colored::{ColoredString, Colorize};
use std::fmt::Display;
use std::time::SystemTime;

/// Receiver for index buffer and device reports
///
/// Implementations must not block for long: device operations report
/// failures while holding the device context lock.
///
/// # Example
///
/// Keep only the reports that need attention:
///
/// ```no_run
/// use index_buffer::log::{LogEntry, LogSeverity, Logger};
/// use index_buffer::Engine;
/// use std::sync::Mutex;
///
/// #[derive(Default)]
/// struct FailureCollector {
///     failures: Mutex<Vec<String>>,
/// }
///
/// impl Logger for FailureCollector {
///     fn log(&self, entry: &LogEntry) {
///         if entry.severity >= LogSeverity::Warn {
///             if let Ok(mut failures) = self.failures.lock() {
///                 failures.push(format!("{}: {}", entry.source, entry.message));
///             }
///         }
///     }
/// }
///
/// Engine::set_logger(FailureCollector::default());
/// ```
pub trait Logger: Send + Sync {
    /// Log an entry
    fn log(&self, entry: &LogEntry);
}

/// One report, as handed to the installed `Logger`
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub severity: LogSeverity,

    /// Local time the report was raised
    pub timestamp: SystemTime,

    /// Reporting type, e.g. `index_buffer::IndexBuffer` or
    /// `index_buffer_device_soft::SoftDevice`
    pub source: String,

    pub message: String,

    /// Where a device failure was raised; `None` below `Error`
    pub file: Option<&'static str>,
    pub line: Option<u32>,
}

/// How urgent a report is, from least to most
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogSeverity {
    Trace,
    /// Allocation and copy-path details
    Debug,
    /// Context creation and teardown
    Info,
    /// Precondition violations and unsupported capabilities
    Warn,
    /// Device and transfer failures
    Error,
}

/// Console logger used until another one is installed
///
/// Lines read `[timestamp] [SEVERITY] [source] message`, followed by
/// `(file:line)` when the report has a location. `Warn` and `Error` go to
/// stderr, the rest to stdout.
pub struct DefaultLogger;

impl DefaultLogger {
    /// Format an entry as a single line, without color codes
    pub fn format_plain(entry: &LogEntry) -> String {
        render(entry, Self::label(entry.severity), &entry.source)
    }

    fn label(severity: LogSeverity) -> &'static str {
        match severity {
            LogSeverity::Trace => "TRACE",
            LogSeverity::Debug => "DEBUG",
            LogSeverity::Info => "INFO ",
            LogSeverity::Warn => "WARN ",
            LogSeverity::Error => "ERROR",
        }
    }

    fn colored_label(severity: LogSeverity) -> ColoredString {
        let label = Self::label(severity);
        match severity {
            LogSeverity::Trace => label.bright_black(),
            LogSeverity::Debug => label.cyan(),
            LogSeverity::Info => label.green(),
            LogSeverity::Warn => label.yellow(),
            LogSeverity::Error => label.red().bold(),
        }
    }
}

fn render(entry: &LogEntry, severity: impl Display, source: impl Display) -> String {
    let local: DateTime<Local> = entry.timestamp.into();
    let mut line = format!(
        "[{}] [{}] [{}] {}",
        local.format("%Y-%m-%d %H:%M:%S%.3f"),
        severity,
        source,
        entry.message
    );
    if let (Some(file), Some(number)) = (entry.file, entry.line) {
        line.push_str(&format!(" ({}:{})", file, number));
    }
    line
}

impl Logger for DefaultLogger {
    fn log(&self, entry: &LogEntry) {
        let line = render(entry, Self::colored_label(entry.severity), entry.source.bright_blue());
        if entry.severity >= LogSeverity::Warn {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
    }
}

// Reporting macros. Each takes the reporting type's name, then `format!`
// arguments.

#[doc(hidden)]
#[macro_export]
macro_rules! __engine_log {
    ($severity:ident, $source:expr, $($arg:tt)*) => {
        $crate::Engine::log($crate::log::LogSeverity::$severity, $source, format!($($arg)*))
    };
}

/// Report at `Trace`
#[macro_export]
macro_rules! engine_trace {
    ($source:expr, $($arg:tt)*) => { $crate::__engine_log!(Trace, $source, $($arg)*) };
}

/// Report at `Debug`
///
/// ```no_run
/// # use index_buffer::engine_debug;
/// let (count, name) = (4, 1);
/// engine_debug!("index_buffer::IndexBuffer", "Allocated {} indices for buffer {}", count, name);
/// ```
#[macro_export]
macro_rules! engine_debug {
    ($source:expr, $($arg:tt)*) => { $crate::__engine_log!(Debug, $source, $($arg)*) };
}

/// Report at `Info`
#[macro_export]
macro_rules! engine_info {
    ($source:expr, $($arg:tt)*) => { $crate::__engine_log!(Info, $source, $($arg)*) };
}

/// Report at `Warn`
#[macro_export]
macro_rules! engine_warn {
    ($source:expr, $($arg:tt)*) => { $crate::__engine_log!(Warn, $source, $($arg)*) };
}

/// Report at `Error`, with the caller's file and line
#[macro_export]
macro_rules! engine_error {
    ($source:expr, $($arg:tt)*) => {
        $crate::Engine::log_detailed(
            $crate::log::LogSeverity::Error,
            $source,
            format!($($arg)*),
            file!(),
            line!(),
        )
    };
}

/// Report at `Error` and evaluate to an `Error::BackendError` with the same message
///
/// Backends use it where a device call fails:
///
/// ```no_run
/// # use index_buffer::{engine_err, Result};
/// fn check_range(offset: u64, len: u64, size: u64) -> Result<()> {
///     if offset.checked_add(len).map_or(true, |end| end > size) {
///         return Err(engine_err!(
///             "index_buffer_device_soft::SoftDevice",
///             "range {}+{} exceeds buffer of {} bytes",
///             offset, len, size
///         ));
///     }
///     Ok(())
/// }
/// ```
#[macro_export]
macro_rules! engine_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::Engine::log_detailed(
            $crate::log::LogSeverity::Error,
            $source,
            message.clone(),
            file!(),
            line!()
        );
        $crate::Error::BackendError(message)
    }};
}

/// `return Err(engine_err!(..))`
#[macro_export]
macro_rules! engine_bail {
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::engine_err!($source, $($arg)*))
    };
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;

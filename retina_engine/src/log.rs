//! Logging for the Retina render graph engine
//!
//! Every subsystem reports through a single replaceable `Logger`:
//! - `Logger` trait for custom sinks (files, test capture, editors)
//! - `LogSeverity` levels from Trace to Error
//! - `DefaultLogger` writing colored lines (warnings and errors to stderr)
//! - `engine_*!` macros that route through `Engine::log`

use colored::*;
use std::time::SystemTime;
use chrono::{DateTime, Local};

/// Sink for engine log entries
///
/// # Example
///
/// ```no_run
/// use retina_engine::retina::log::{Logger, LogEntry};
///
/// struct StderrLogger;
///
/// impl Logger for StderrLogger {
///     fn log(&self, entry: &LogEntry) {
///         eprintln!("[{}] {}", entry.source, entry.message);
///     }
/// }
/// ```
pub trait Logger: Send + Sync {
    /// Consume one entry
    fn log(&self, entry: &LogEntry);
}

/// A single log record
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// Severity level
    pub severity: LogSeverity,

    /// When the entry was produced
    pub timestamp: SystemTime,

    /// Emitting subsystem (e.g. "retina::FrameBufferPool")
    pub source: String,

    /// Formatted message
    pub message: String,

    /// Source file, only filled for ERROR entries
    pub file: Option<&'static str>,

    /// Source line, only filled for ERROR entries
    pub line: Option<u32>,
}

/// Log severity levels, ordered from most to least verbose
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogSeverity {
    /// Per-framebuffer bookkeeping (reuse, return)
    Trace,

    /// Allocation and graph installation details
    Debug,

    /// Rare lifecycle events (surface resize, graph rebuilt)
    Info,

    /// Graphs that run but probably not as intended (an input nothing writes)
    Warn,

    /// Ownership and hazard violations, backend failures
    Error,
}

impl LogSeverity {
    /// Fixed-width label used in console output
    pub fn label(self) -> &'static str {
        match self {
            LogSeverity::Trace => "TRACE",
            LogSeverity::Debug => "DEBUG",
            LogSeverity::Info => "INFO ",
            LogSeverity::Warn => "WARN ",
            LogSeverity::Error => "ERROR",
        }
    }

    /// Warn and Error go to stderr, the rest to stdout
    pub fn is_alert(self) -> bool {
        self >= LogSeverity::Warn
    }
}

/// Split "retina::FrameBufferPool" into ("retina::", "FrameBufferPool")
///
/// A source without a namespace is all component.
pub(crate) fn split_source(source: &str) -> (&str, &str) {
    match source.rfind("::") {
        Some(index) => source.split_at(index + 2),
        None => ("", source),
    }
}

/// Console logger used until `Engine::set_logger` installs another one
///
/// Format: `[timestamp] [SEVERITY] namespace::Component message`, with
/// ` (file:line)` appended when the entry carries a location. The component
/// is highlighted so per-frame pool and composer traffic stays readable.
pub struct DefaultLogger;

impl DefaultLogger {
    fn format(entry: &LogEntry) -> String {
        let datetime: DateTime<Local> = entry.timestamp.into();
        let timestamp = datetime.format("%H:%M:%S%.3f").to_string();

        let label = entry.severity.label();
        let severity = match entry.severity {
            LogSeverity::Trace => label.bright_black(),
            LogSeverity::Debug => label.cyan(),
            LogSeverity::Info => label.green(),
            LogSeverity::Warn => label.yellow().bold(),
            LogSeverity::Error => label.red().bold(),
        };

        let (namespace, component) = split_source(&entry.source);
        let mut line = format!(
            "[{}] [{}] {}{} {}",
            timestamp.bright_black(),
            severity,
            namespace.bright_black(),
            component.bright_blue().bold(),
            entry.message
        );
        if let (Some(file), Some(number)) = (entry.file, entry.line) {
            line.push_str(&format!(" ({}:{})", file, number).bright_black().to_string());
        }
        line
    }
}

impl Logger for DefaultLogger {
    fn log(&self, entry: &LogEntry) {
        let line = Self::format(entry);
        if entry.severity.is_alert() {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
    }
}

// ===== LOGGING MACROS =====

/// Shared body of the non-error severity macros
#[doc(hidden)]
#[macro_export]
macro_rules! engine_log {
    ($severity:ident, $source:expr, $($arg:tt)*) => {
        $crate::retina::Engine::log(
            $crate::retina::log::LogSeverity::$severity,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log a TRACE message
///
/// ```ignore
/// engine_trace!("retina::FrameBufferPool", "reusing '{}'", name);
/// ```
#[macro_export]
macro_rules! engine_trace {
    ($($arg:tt)*) => { $crate::engine_log!(Trace, $($arg)*) };
}

#[macro_export]
macro_rules! engine_debug {
    ($($arg:tt)*) => { $crate::engine_log!(Debug, $($arg)*) };
}

#[macro_export]
macro_rules! engine_info {
    ($($arg:tt)*) => { $crate::engine_log!(Info, $($arg)*) };
}

#[macro_export]
macro_rules! engine_warn {
    ($($arg:tt)*) => { $crate::engine_log!(Warn, $($arg)*) };
}

/// Log an ERROR message, recording the call site's file and line
///
/// ```ignore
/// engine_error!("retina::EffectComposer", "pass '{}' failed: {}", name, err);
/// ```
#[macro_export]
macro_rules! engine_error {
    ($source:expr, $($arg:tt)*) => {
        $crate::retina::Engine::log_detailed(
            $crate::retina::log::LogSeverity::Error,
            $source,
            format!($($arg)*),
            file!(),
            line!()
        )
    };
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;

/// Retina Engine - process-wide logging entry point
///
/// The logger is the only global in the engine. Framebuffer pools, kept
/// tables and render graphs are plain values owned by the caller.

use std::sync::{OnceLock, RwLock};
use std::time::SystemTime;
use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};

/// Global logger (initialized with DefaultLogger)
static LOGGER: OnceLock<RwLock<Box<dyn Logger>>> = OnceLock::new();

fn logger() -> &'static RwLock<Box<dyn Logger>> {
    LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)))
}

/// Engine-wide services
///
/// # Example
///
/// ```no_run
/// use retina_engine::retina::{Engine, log::{Logger, LogEntry}};
///
/// struct Silent;
/// impl Logger for Silent {
///     fn log(&self, _entry: &LogEntry) {}
/// }
///
/// Engine::set_logger(Silent);
/// ```
pub struct Engine;

impl Engine {
    /// Replace the active logger
    pub fn set_logger<L: Logger + 'static>(logger_impl: L) {
        if let Ok(mut lock) = logger().write() {
            *lock = Box::new(logger_impl);
        }
    }

    /// Restore the colored console logger
    pub fn reset_logger() {
        if let Ok(mut lock) = logger().write() {
            *lock = Box::new(DefaultLogger);
        }
    }

    /// Dispatch an entry without file:line (used by engine_trace! .. engine_warn!)
    pub fn log(severity: LogSeverity, source: &str, message: String) {
        if let Ok(lock) = logger().read() {
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

    /// Dispatch an entry carrying file:line (used by engine_error!)
    pub fn log_detailed(
        severity: LogSeverity,
        source: &str,
        message: String,
        file: &'static str,
        line: u32,
    ) {
        if let Ok(lock) = logger().read() {
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

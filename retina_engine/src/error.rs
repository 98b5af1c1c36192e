//! Error types for the Retina engine
//!
//! Every error here is a programming or configuration error. Nothing in the
//! render graph retries: an error aborts the current `render()` call and
//! leaves the pool and kept table in a consistent state for the next one.

use std::fmt;

/// Result type for Retina engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Retina engine errors
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Backend call failed (draw submission, framebuffer creation, ...)
    BackendError(String),

    /// Out of GPU memory while allocating a framebuffer
    OutOfMemory,

    /// A framebuffer was returned to a pool that did not allocate it
    OwnershipViolation(String),

    /// A pass reads the render target it writes to
    HazardViolation {
        /// Offending pass
        pass: String,
        /// Target that is both read and written
        target: String,
    },

    /// Graph definition is malformed (unknown or duplicate target names)
    InvalidGraph(String),

    /// A backend capability required by the graph is unavailable
    Unsupported(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::OwnershipViolation(msg) => write!(f, "Ownership violation: {}", msg),
            Error::HazardViolation { pass, target } => write!(
                f,
                "Hazard violation: pass '{}' reads render target '{}' it also writes",
                pass, target
            ),
            Error::InvalidGraph(msg) => write!(f, "Invalid graph: {}", msg),
            Error::Unsupported(msg) => write!(f, "Unsupported: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

/// Log a message at ERROR severity and return `Err(Error::BackendError(..))`
///
/// ```ignore
/// engine_bail!("retina::mock", "source '{}' rejected", name);
/// ```
#[macro_export]
macro_rules! engine_bail {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::engine_error!($source, "{}", message);
        return Err($crate::retina::Error::BackendError(message));
    }};
}

/// Log an already-built `Error` at ERROR severity and evaluate to it
///
/// ```ignore
/// return Err(engine_err!("retina::FrameBufferPool", Error::OutOfMemory));
/// ```
#[macro_export]
macro_rules! engine_err {
    ($source:expr, $error:expr) => {{
        let error = $error;
        $crate::engine_error!($source, "{}", error);
        error
    }};
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;

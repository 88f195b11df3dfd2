//! Error types for the index buffer crate
//!
//! Every failure is non-fatal: operations hand the error back to the caller
//! after reporting it to the logger.

use std::fmt;

/// Result type for index buffer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Index buffer errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The device lacks the capability the operation needs
    UnsupportedPlatform(String),

    /// The device could not generate a new buffer identifier
    ResourceExhausted(String),

    /// Operation on an unallocated buffer, or an out-of-range region
    PreconditionViolated(String),

    /// A mapped-memory transfer was reported corrupt by the device
    TransferFailed(String),

    /// Backend-specific error reported by the device
    BackendError(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnsupportedPlatform(msg) => write!(f, "Unsupported platform: {}", msg),
            Error::ResourceExhausted(msg) => write!(f, "Resource exhausted: {}", msg),
            Error::PreconditionViolated(msg) => write!(f, "Precondition violated: {}", msg),
            Error::TransferFailed(msg) => write!(f, "Transfer failed: {}", msg),
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;

//! Error types for the Nova3D shader pipeline
//!
//! One error enum is shared by the core crate and the driver backends.
//! Recoverable failures (a stage that fails to translate or compile)
//! do NOT surface here - they degrade the owning object's validity
//! flag instead, so the rest of the program build can continue.

use std::fmt;

/// Result type for Nova3D operations
pub type Result<T> = std::result::Result<T, Error>;

/// Nova3D errors
#[derive(Debug, Clone)]
pub enum Error {
    /// Backend-specific error (driver call failed, lock poisoned, ...)
    BackendError(String),

    /// Invalid resource (malformed cache stream, unknown parameter, ...)
    InvalidResource(String),

    /// Initialization failed
    InitializationFailed(String),

    /// Intermediate bytecode could not be converted to native source
    TranslationFailed(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::TranslationFailed(msg) => write!(f, "Translation failed: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;

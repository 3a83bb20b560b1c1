//! Error types for Turnstile.

use thiserror::Error;

/// Main error type for Turnstile operations.
///
/// Only policy loading can fail; admission decisions are plain booleans
/// and a denied request is not an error.
#[derive(Error, Debug)]
pub enum TurnstileError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Turnstile operations.
pub type Result<T> = std::result::Result<T, TurnstileError>;

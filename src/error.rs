//! Error types for the Windowgate service.

use thiserror::Error;

/// Main error type for Windowgate operations.
#[derive(Error, Debug)]
pub enum WindowgateError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors, including listener bind and serve failures
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for WindowgateError {
    fn from(e: config::ConfigError) -> Self {
        WindowgateError::Config(e.to_string())
    }
}

/// Result type alias for Windowgate operations.
pub type Result<T> = std::result::Result<T, WindowgateError>;

//! Error types for app-error
//!
//! This module defines the failures the library itself can report.
//! Normalizing user failures never fails; these cover configuration and I/O.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.

use std::io;
use thiserror::Error;

/// Result type alias for app-error operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the app-error library
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error (reading or writing a config file)
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// Configuration could not be parsed or is invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// Global configuration was already installed
    #[error("Configuration already initialized")]
    AlreadyInitialized,
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}

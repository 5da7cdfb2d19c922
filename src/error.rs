//! Error types for page capture and settings storage

use thiserror::Error;

/// Result type alias for capture operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while capturing a page or managing limits
///
/// Hitting a depth or node limit is not an error: the walker records a
/// warning on the capture instead.
#[derive(Error, Debug)]
pub enum Error {
    /// There is no attached root element to capture
    #[error("No capture target: {0}")]
    NoCaptureTarget(String),

    /// The settings store could not be read or written
    #[error("Settings storage failed: {0}")]
    StorageError(String),

    /// A limit value was zero or otherwise unusable
    #[error("Invalid limits: {0}")]
    InvalidLimits(String),

    /// Failed to load a document source
    #[error("Failed to load document: {0}")]
    LoadError(String),

    /// Failed to encode or decode JSON
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::StorageError(err.to_string())
    }
}

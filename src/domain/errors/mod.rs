// Domain errors - Error types for the domain layer

use thiserror::Error;

/// Domain-specific error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Invalid arguments provided
    #[error("Bad arguments: {0}")]
    BadArgs(String),
    /// Trim bounds do not form a valid range
    #[error("Invalid time range: start ({start_ms} ms) must be less than end ({end_ms} ms)")]
    InvalidTimeRange { start_ms: u64, end_ms: u64 },
    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(String),
    /// Invalid or unsupported media
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
    /// Failure reported by the transformation engine
    #[error("{0}")]
    ProcessingError(String),
    /// Failure reported by the playback engine
    #[error("Playback error: {0}")]
    PlaybackError(String),
    /// The job was cancelled before completion
    #[error("cancelled")]
    Cancelled,
    /// File system failure
    #[error("File system error: {0}")]
    FsFail(String),
    /// Configuration failure
    #[error("Configuration error: {0}")]
    ConfigError(String),
    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<std::io::Error> for DomainError {
    fn from(err: std::io::Error) -> Self {
        DomainError::FsFail(err.to_string())
    }
}

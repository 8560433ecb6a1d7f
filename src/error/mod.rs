//! Error handling module for Cutframe

use thiserror::Error;

/// Main error type for Cutframe library operations
#[derive(Error, Debug)]
pub enum CutframeError {
    /// FFmpeg initialization error
    #[error("Failed to initialize FFmpeg: {message}")]
    FFmpegInitError { message: String },

    /// Session loop failure (input stream closed unexpectedly, channel dropped)
    #[error("Session error: {message}")]
    SessionError { message: String },

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type alias for Cutframe operations
pub type CutframeResult<T> = std::result::Result<T, CutframeError>;

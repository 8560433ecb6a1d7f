//! Cutframe terminal video editor library
//!
//! A single screen controller owns the editing session (picked video, preview
//! player, trim bounds, outstanding job) and reaches the outside world through
//! ports: a media picker, a libav-backed preview and transformation engine, the
//! shared gallery, storage permissions and a notifier.

pub mod adapters;
pub mod app;
pub mod cli;
pub mod config_initialization;
pub mod domain;
pub mod error;
pub mod ports;

// Re-export commonly used types
pub use domain::errors::DomainError;
pub use error::{CutframeError, CutframeResult};

/// Initialize Cutframe library
pub fn init() -> CutframeResult<()> {
    // Initialize FFmpeg
    ffmpeg_next::init().map_err(|e| CutframeError::FFmpegInitError {
        message: e.to_string(),
    })?;

    Ok(())
}

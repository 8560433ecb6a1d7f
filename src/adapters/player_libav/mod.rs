// Playback adapter - Prepares a preview player by probing media with libav

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Opens preview sessions; each one probes its source off the session task
pub struct LibavPlaybackAdapter;

impl LibavPlaybackAdapter {
    pub fn new() -> Self {
        Self
    }

    /// Total duration in milliseconds, from the container or the best video stream
    pub fn probe_duration_ms(path: &Path) -> Result<u64, DomainError> {
        let input = ffmpeg_next::format::input(&path).map_err(|e| {
            DomainError::PlaybackError(format!("Failed to open {}: {}", path.display(), e))
        })?;

        let container = input.duration();
        if container > 0 {
            return Ok((container as f64 / ffmpeg_next::ffi::AV_TIME_BASE as f64 * 1000.0) as u64);
        }

        let stream = input
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or_else(|| DomainError::PlaybackError("No video stream found".to_string()))?;
        let time_base = stream.time_base();
        let duration = stream.duration();
        if duration <= 0 || time_base.denominator() == 0 {
            return Err(DomainError::PlaybackError(
                "Media does not report a duration".to_string(),
            ));
        }
        let seconds =
            duration as f64 * time_base.numerator() as f64 / time_base.denominator() as f64;
        Ok((seconds * 1000.0) as u64)
    }
}

impl Default for LibavPlaybackAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackPort for LibavPlaybackAdapter {
    fn open(
        &self,
        source: &ContentRef,
        generation: u64,
        events: EventSink,
    ) -> Result<Box<dyn PlayerSession>, DomainError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| DomainError::InternalError(format!("No async runtime: {}", e)))?;

        let released = Arc::new(AtomicBool::new(false));
        let path = source.to_file_path();
        let released_flag = Arc::clone(&released);

        runtime.spawn(async move {
            let probe_path = path.clone();
            let outcome = tokio::task::spawn_blocking(move || Self::probe_duration_ms(&probe_path))
                .await
                .unwrap_or_else(|e| Err(DomainError::InternalError(e.to_string())));

            // A released player never reports state
            if released_flag.load(Ordering::SeqCst) {
                return;
            }

            let event = match outcome {
                Ok(duration_ms) => {
                    tracing::debug!("Player {} ready: {} ms", generation, duration_ms);
                    PlaybackEvent::Ready {
                        generation,
                        duration_ms,
                    }
                }
                Err(e) => PlaybackEvent::Failed {
                    generation,
                    message: e.to_string(),
                },
            };
            let _ = events.send(UiEvent::Playback(event));
        });

        Ok(Box::new(LibavPlayerSession {
            generation,
            released,
        }))
    }
}

/// Handle to a prepared player
pub struct LibavPlayerSession {
    generation: u64,
    released: Arc<AtomicBool>,
}

impl PlayerSession for LibavPlayerSession {
    fn release(&mut self) {
        if !self.released.swap(true, Ordering::SeqCst) {
            tracing::debug!("Released player {}", self.generation);
        }
    }

    fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }
}

impl Drop for LibavPlayerSession {
    fn drop(&mut self) {
        self.release();
    }
}

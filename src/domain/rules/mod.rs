// Domain rules - Business logic and policies

use std::path::{Path, PathBuf};

use crate::domain::errors::*;
use crate::domain::model::*;


/// Rules for turning slider input into a trim range
pub struct TrimRules;

impl TrimRules {
    /// Scale a slider position against the media duration
    pub fn bound_from_position(position: SliderPosition, duration_ms: u64) -> u64 {
        position.value() as u64 * duration_ms / SliderPosition::MAX as u64
    }

    /// Validate the two independently recorded bounds
    pub fn validate(start_ms: u64, end_ms: u64) -> Result<TrimRange, DomainError> {
        TrimRange::new(start_ms, end_ms)
    }
}

/// Naming policy for files produced during a session
pub struct OutputNaming;

impl OutputNaming {
    /// Extension of every produced file
    pub const EXTENSION: &'static str = "mp4";

    /// Gallery display name prefix
    pub const GALLERY_PREFIX: &'static str = "VideoEditado";

    /// Time-stamped working file name, e.g. `trimmed_video_1700000000000.mp4`
    pub fn working_file_name(kind: JobKind, millis: i64) -> String {
        format!("{}_{}.{}", kind.output_prefix(), millis, Self::EXTENSION)
    }

    /// Time-stamped working file inside app-private storage
    pub fn working_file(dir: &Path, kind: JobKind, millis: i64) -> PathBuf {
        dir.join(Self::working_file_name(kind, millis))
    }

    /// Display name of the gallery entry written by a save
    pub fn gallery_display_name(millis: i64) -> String {
        format!("{}_{}.{}", Self::GALLERY_PREFIX, millis, Self::EXTENSION)
    }

    /// Current wall clock in milliseconds, used as the time stamp
    pub fn timestamp_millis() -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Format milliseconds as `mm:ss` (minutes are not wrapped into hours)
pub fn format_clock(milliseconds: u64) -> String {
    let total_seconds = milliseconds / 1000;
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    format!("{:02}:{:02}", minutes, seconds)
}

/// User-facing message catalogue
pub struct Messages;

impl Messages {
    pub const SELECT_VIDEO_FIRST: &'static str = "Select a video first";
    pub const START_BEFORE_END: &'static str = "Start time must be less than end time";
    pub const OPERATION_IN_PROGRESS: &'static str = "Another operation is in progress";
    pub const READ_PERMISSION_REQUIRED: &'static str =
        "Storage read permission is required to pick a video";
    pub const WRITE_PERMISSION_REQUIRED: &'static str =
        "Storage write permission is required to save a video";
    pub const TRIMMING: &'static str = "Trimming video...";
    pub const TRIM_DONE: &'static str = "Video trimmed successfully!";
    pub const TRIM_FAILED: &'static str = "Error trimming video";
    pub const FILTERING: &'static str = "Applying filter...";
    pub const FILTER_DONE: &'static str = "Filter applied successfully!";
    pub const FILTER_FAILED: &'static str = "Error applying filter";
    pub const SAVING: &'static str = "Saving video...";
    pub const SAVE_DONE: &'static str = "Video saved to gallery";
    pub const SAVE_FAILED: &'static str = "Error saving video";
    pub const CANCELLED: &'static str = "Operation cancelled";
    pub const NOTHING_TO_CANCEL: &'static str = "No operation to cancel";
    pub const PLAYBACK_FAILED: &'static str = "Error loading video";

    /// Failure message carrying the underlying cause
    pub fn failure(prefix: &str, cause: &DomainError) -> String {
        format!("{}: {}", prefix, cause)
    }

    pub fn started(kind: JobKind) -> &'static str {
        match kind {
            JobKind::Trim => Self::TRIMMING,
            JobKind::Filter => Self::FILTERING,
            JobKind::Save => Self::SAVING,
        }
    }

    pub fn succeeded(kind: JobKind) -> &'static str {
        match kind {
            JobKind::Trim => Self::TRIM_DONE,
            JobKind::Filter => Self::FILTER_DONE,
            JobKind::Save => Self::SAVE_DONE,
        }
    }

    pub fn failed(kind: JobKind) -> &'static str {
        match kind {
            JobKind::Trim => Self::TRIM_FAILED,
            JobKind::Filter => Self::FILTER_FAILED,
            JobKind::Save => Self::SAVE_FAILED,
        }
    }
}

// Domain models - Core types and data structures

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;

#[cfg(test)]
mod tests;

/// MIME type of every file the transformation engine and the gallery produce
pub const VIDEO_MP4_MIME: &str = "video/mp4";

/// Opaque locator for a media item
///
/// References handed out by the picker are either `file://` URIs or plain
/// paths. Only the file scheme can be resolved to bytes on disk.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentRef {
    uri: String,
}

impl ContentRef {
    const FILE_SCHEME: &'static str = "file://";

    /// Parse a reference from user or platform input
    pub fn parse(uri: &str) -> Result<Self, DomainError> {
        let trimmed = uri.trim();
        if trimmed.is_empty() {
            return Err(DomainError::BadArgs(
                "Content reference cannot be empty".to_string(),
            ));
        }
        if let Some((scheme, _)) = trimmed.split_once("://") {
            if scheme != "file" {
                return Err(DomainError::InvalidFormat(format!(
                    "Unsupported content scheme: {}",
                    scheme
                )));
            }
        }
        Ok(Self {
            uri: trimmed.to_string(),
        })
    }

    /// Build a file reference for a path produced by this application
    pub fn from_path(path: &Path) -> Self {
        Self {
            uri: format!("{}{}", Self::FILE_SCHEME, path.to_string_lossy()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.uri
    }

    /// Resolve the reference to a local file path
    pub fn to_file_path(&self) -> PathBuf {
        PathBuf::from(self.uri.strip_prefix(Self::FILE_SCHEME).unwrap_or(&self.uri))
    }

    /// Last path component, used for display
    pub fn display_name(&self) -> String {
        self.to_file_path()
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| self.uri.clone())
    }
}

impl fmt::Display for ContentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.uri)
    }
}

/// Position of a trim slider, always within `0..=100`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SliderPosition(u8);

impl SliderPosition {
    pub const MAX: u8 = 100;
    pub const ZERO: SliderPosition = SliderPosition(0);
    pub const FULL: SliderPosition = SliderPosition(Self::MAX);

    pub fn new(value: u8) -> Result<Self, DomainError> {
        if value > Self::MAX {
            return Err(DomainError::BadArgs(format!(
                "Slider position must be between 0 and {}, got {}",
                Self::MAX,
                value
            )));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

/// Which end of the trim range a slider controls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrimBound {
    Start,
    End,
}

/// Validated trim range in milliseconds, `start_ms < end_ms`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrimRange {
    pub start_ms: u64,
    pub end_ms: u64,
}

impl TrimRange {
    pub fn new(start_ms: u64, end_ms: u64) -> Result<Self, DomainError> {
        if start_ms >= end_ms {
            return Err(DomainError::InvalidTimeRange { start_ms, end_ms });
        }
        Ok(Self { start_ms, end_ms })
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.end_ms - self.start_ms)
    }

    pub fn start_seconds(&self) -> f64 {
        self.start_ms as f64 / 1000.0
    }

    pub fn end_seconds(&self) -> f64 {
        self.end_ms as f64 / 1000.0
    }
}

/// Effect applied by the transformation engine to every video frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EffectDescriptor {
    Sepia,
    Grayscale,
    Contrast { amount: f32 },
}

/// Filters offered to the user, in menu order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    Sepia,
    Grayscale,
    HighContrast,
    None,
}

impl FilterKind {
    pub const ALL: [FilterKind; 4] = [
        FilterKind::Sepia,
        FilterKind::Grayscale,
        FilterKind::HighContrast,
        FilterKind::None,
    ];

    /// Look up a filter by its menu index
    pub fn from_index(index: usize) -> Result<Self, DomainError> {
        Self::ALL.get(index).copied().ok_or_else(|| {
            DomainError::BadArgs(format!(
                "Invalid filter index: {}. Valid indexes: 0-{}",
                index,
                Self::ALL.len() - 1
            ))
        })
    }

    /// Parse a filter from its index or name
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        let value = value.trim();
        if let Ok(index) = value.parse::<usize>() {
            return Self::from_index(index);
        }
        match value.to_lowercase().replace(['_', ' '], "-").as_str() {
            "sepia" => Ok(FilterKind::Sepia),
            "grayscale" | "greyscale" | "gray" | "grey" => Ok(FilterKind::Grayscale),
            "high-contrast" | "contrast" => Ok(FilterKind::HighContrast),
            "none" => Ok(FilterKind::None),
            _ => Err(DomainError::BadArgs(format!(
                "Invalid filter: {}. Valid filters: sepia, grayscale, high-contrast, none",
                value
            ))),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FilterKind::Sepia => "Sepia",
            FilterKind::Grayscale => "Grayscale",
            FilterKind::HighContrast => "High-Contrast",
            FilterKind::None => "None",
        }
    }

    /// Effect list handed to the engine for this filter
    pub fn effects(&self, contrast: f32) -> Vec<EffectDescriptor> {
        match self {
            FilterKind::Sepia => vec![EffectDescriptor::Sepia],
            FilterKind::Grayscale => vec![EffectDescriptor::Grayscale],
            FilterKind::HighContrast => vec![EffectDescriptor::Contrast { amount: contrast }],
            FilterKind::None => Vec::new(),
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Kind of outstanding job tracked by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    Trim,
    Filter,
    Save,
}

impl JobKind {
    /// File name prefix for the job's output in app-private storage
    pub fn output_prefix(&self) -> &'static str {
        match self {
            JobKind::Trim => "trimmed_video",
            JobKind::Filter => "filtered_video",
            JobKind::Save => "final_video",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobKind::Trim => "trim",
            JobKind::Filter => "filter",
            JobKind::Save => "save",
        };
        write!(f, "{}", name)
    }
}

/// Request handed to the transformation engine
#[derive(Debug, Clone, PartialEq)]
pub struct TransformRequest {
    pub job_id: u64,
    pub kind: JobKind,
    pub input: ContentRef,
    pub output_path: PathBuf,
    pub trim: Option<TrimRange>,
    pub effects: Vec<EffectDescriptor>,
    pub video_mime: String,
}

/// Summary produced by a successful transform
#[derive(Debug, Clone, PartialEq)]
pub struct TransformReport {
    pub output_path: PathBuf,
    pub frames_written: u64,
    pub processing_time: Duration,
}

/// Metadata supplied when inserting a gallery entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryEntryMeta {
    pub display_name: String,
    pub mime_type: String,
    pub relative_path: String,
}

/// A row in the shared media collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryEntry {
    pub id: String,
    #[serde(flatten)]
    pub meta: GalleryEntryMeta,
    pub is_pending: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub size: u64,
}

/// Storage access classes gated by the permission port
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageAccess {
    Read,
    Write,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    Granted,
    Denied,
}

/// Severity of a user-facing message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// How long a user-facing message stays visible
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLength {
    Short,
    Long,
}

/// Transient message shown to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub length: NoticeLength,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            length: NoticeLength::Short,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            length: NoticeLength::Short,
            message: message.into(),
        }
    }

    pub fn long(mut self) -> Self {
        self.length = NoticeLength::Long;
        self
    }
}

/// Coarse phase of the editing session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Empty,
    HasSource,
    Previewing,
    Exporting,
}

/// Playback state transitions reported by the playback engine
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    Ready { generation: u64, duration_ms: u64 },
    Failed { generation: u64, message: String },
}

/// Everything that flows back onto the session task
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    Playback(PlaybackEvent),
    TransformFinished {
        job_id: u64,
        kind: JobKind,
        result: Result<TransformReport, DomainError>,
    },
    SaveFinished {
        job_id: u64,
        result: Result<GalleryEntry, DomainError>,
    },
}

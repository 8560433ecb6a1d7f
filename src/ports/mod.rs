// Ports - Interface definitions (contracts)

use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedSender;

use crate::domain::errors::*;
use crate::domain::model::*;

/// Channel that carries results back onto the session task
pub type EventSink = UnboundedSender<UiEvent>;

/// Shared cancellation flag for a running job
pub type CancelFlag = Arc<AtomicBool>;

/// Selection request sent to the picker
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PickRequest {
    /// Path or index into the last browse listing; `None` means the user backed out
    pub query: Option<String>,
}

impl PickRequest {
    pub fn new(query: Option<String>) -> Self {
        Self { query }
    }
}

/// Port for choosing a video from the shared media collection
#[async_trait]
pub trait PickerPort: Send + Sync {
    /// List videos the user can choose from
    async fn browse(&self) -> Result<Vec<ContentRef>, DomainError>;

    /// Resolve a selection; `Ok(None)` when the user cancelled
    async fn pick(&self, request: &PickRequest) -> Result<Option<ContentRef>, DomainError>;
}

/// A prepared player bound to one content reference
pub trait PlayerSession: Send {
    /// Release decoder resources; calling twice is a no-op
    fn release(&mut self);

    fn is_released(&self) -> bool;
}

/// Port for the preview player
pub trait PlaybackPort: Send + Sync {
    /// Build and prepare a player. Readiness is reported later through `events`.
    fn open(
        &self,
        source: &ContentRef,
        generation: u64,
        events: EventSink,
    ) -> Result<Box<dyn PlayerSession>, DomainError>;
}

/// Port for the transformation engine
#[async_trait]
pub trait TransformPort: Send + Sync {
    /// Run one transform job to completion. Exactly one outcome is returned;
    /// a set `cancel` flag ends the job with `DomainError::Cancelled`.
    async fn transform(
        &self,
        request: &TransformRequest,
        cancel: CancelFlag,
    ) -> Result<TransformReport, DomainError>;
}

/// Port for app-private storage
pub trait PrivateStoragePort: Send + Sync {
    /// Directory where working files are written
    fn working_dir(&self) -> PathBuf;

    /// Copy the referenced content into private storage under `file_name`
    fn import(&self, source: &ContentRef, file_name: &str) -> Result<PathBuf, DomainError>;
}

/// Port for the shared media collection
pub trait GalleryPort: Send + Sync {
    /// Insert a pending entry that other consumers cannot see yet
    fn insert(&self, meta: &GalleryEntryMeta) -> Result<GalleryEntry, DomainError>;

    /// Open a byte sink for a pending entry
    fn open_output(&self, id: &str) -> Result<Box<dyn Write + Send>, DomainError>;

    /// Clear the pending flag, publishing the entry
    fn finalize(&self, id: &str) -> Result<GalleryEntry, DomainError>;

    /// Remove an entry and its bytes
    fn delete(&self, id: &str) -> Result<(), DomainError>;

    /// Entries visible to other consumers (pending ones excluded)
    fn list_visible(&self) -> Result<Vec<GalleryEntry>, DomainError>;
}

/// Port for runtime storage permissions
#[async_trait]
pub trait PermissionPort: Send + Sync {
    /// Current state without prompting
    async fn check(&self, access: StorageAccess) -> PermissionState;

    /// Ask for access, returning the resulting state
    async fn request(&self, access: StorageAccess) -> PermissionState;
}

/// Port for transient user-facing messages
pub trait NotifierPort: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Port for configuration management
#[async_trait]
pub trait ConfigPort: Send + Sync {
    /// Get configuration value
    async fn get_config(&self, key: &str) -> Result<Option<String>, DomainError>;

    /// Get configuration value with default
    async fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, DomainError>;

    /// Set configuration value
    async fn set_config(&self, key: &str, value: &str) -> Result<(), DomainError>;

    /// Load configuration from file
    async fn load_config(&self, file_path: &str) -> Result<(), DomainError>;

    /// Save configuration to file
    async fn save_config(&self, file_path: &str) -> Result<(), DomainError>;

    /// Validate configuration
    async fn validate_config(&self) -> Result<(), DomainError>;
}

/// Port for logging and observability
#[async_trait]
pub trait LogPort: Send + Sync {
    /// Log info message
    async fn info(&self, message: &str);

    /// Log warning message
    async fn warn(&self, message: &str);

    /// Log error message
    async fn error(&self, message: &str);

    /// Log debug message
    async fn debug(&self, message: &str);

    /// Log structured event
    async fn log_event(&self, event: &LogEvent);
}

/// Log event with structured data
#[derive(Debug, Clone)]
pub struct LogEvent {
    pub level: LogLevel,
    pub message: String,
    pub timestamp: std::time::SystemTime,
    pub context: HashMap<String, String>,
}

impl LogEvent {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            timestamp: std::time::SystemTime::now(),
            context: HashMap::new(),
        }
    }

    pub fn with(mut self, key: &str, value: impl ToString) -> Self {
        self.context.insert(key.to_string(), value.to_string());
        self
    }
}

/// Log level enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Parse log level from string
    pub fn parse(level_str: &str) -> Result<Self, DomainError> {
        match level_str.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(DomainError::BadArgs(format!(
                "Invalid log level: {}. Valid levels: trace, debug, info, warn, error",
                level_str
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

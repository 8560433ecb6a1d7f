// Adapters - External system implementations

pub mod gallery_fs;
pub mod notifier_console;
pub mod permission_fs;
pub mod picker_fs;
pub mod player_libav;
pub mod toml_config;
pub mod tracing_log;
pub mod transform_libav;

// Re-export adapters
pub use gallery_fs::{FsGalleryAdapter, FsPrivateStorageAdapter};
pub use notifier_console::ConsoleNotifierAdapter;
pub use permission_fs::FsPermissionAdapter;
pub use picker_fs::FsPickerAdapter;
pub use player_libav::LibavPlaybackAdapter;
pub use toml_config::TomlConfigAdapter;
pub use tracing_log::TracingLogAdapter;
pub use transform_libav::{EncoderSettings, LibavTransformAdapter};

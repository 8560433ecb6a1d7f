use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver};

use crate::adapters::{
    ConsoleNotifierAdapter, EncoderSettings, FsGalleryAdapter, FsPermissionAdapter, FsPickerAdapter,
    FsPrivateStorageAdapter, LibavPlaybackAdapter, LibavTransformAdapter, TracingLogAdapter,
};
use crate::app::controller::{ControllerOptions, ControllerPorts, ScreenController};
use crate::config_initialization::Settings;
use crate::domain::model::*;
use crate::ports::*;

pub trait AppContainer: Send + Sync {
    /// Fresh controller plus the receiving end of its event channel
    fn screen_controller(&self) -> (ScreenController, UnboundedReceiver<UiEvent>);
    fn gallery(&self) -> Arc<dyn GalleryPort>;
}

pub struct DefaultAppContainer {
    ports: ControllerPorts,
    options: ControllerOptions,
}

impl DefaultAppContainer {
    pub fn new(settings: &Settings) -> Self {
        let gallery = Arc::new(FsGalleryAdapter::new(settings.gallery_dir.clone()));
        let storage = Arc::new(FsPrivateStorageAdapter::new(settings.app_data_dir.clone()));
        let permissions = Arc::new(FsPermissionAdapter::new(
            settings.source_dirs.clone(),
            vec![
                settings.app_data_dir.clone(),
                settings.gallery_dir.join(&settings.gallery_folder),
            ],
        ));
        let transform = Arc::new(LibavTransformAdapter::new(EncoderSettings {
            crf: settings.video_crf,
            preset: settings.video_preset.clone(),
            ..EncoderSettings::default()
        }));

        let ports = ControllerPorts {
            picker: Arc::new(FsPickerAdapter::new(settings.source_dirs.clone())),
            playback: Arc::new(LibavPlaybackAdapter::new()),
            transform,
            storage,
            gallery,
            permissions,
            notifier: Arc::new(ConsoleNotifierAdapter::stdout()),
            log: Arc::new(TracingLogAdapter::new(settings.log_level)),
        };

        Self {
            ports,
            options: ControllerOptions {
                gallery_folder: settings.gallery_folder.clone(),
                contrast: settings.contrast,
            },
        }
    }

    /// Ask for both storage access classes up front, as the session starts
    pub async fn request_startup_permissions(&self) {
        for access in [StorageAccess::Read, StorageAccess::Write] {
            if self.ports.permissions.check(access).await == PermissionState::Denied {
                let state = self.ports.permissions.request(access).await;
                if state == PermissionState::Denied {
                    tracing::warn!("Storage {:?} access not granted", access);
                }
            }
        }
    }
}

impl AppContainer for DefaultAppContainer {
    fn screen_controller(&self) -> (ScreenController, UnboundedReceiver<UiEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let controller = ScreenController::new(self.ports.clone(), self.options.clone(), events);
        (controller, receiver)
    }

    fn gallery(&self) -> Arc<dyn GalleryPort> {
        Arc::clone(&self.ports.gallery)
    }
}

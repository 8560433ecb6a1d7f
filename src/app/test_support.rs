// In-memory ports shared by the controller and session tests

use std::collections::HashMap;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::sync::mpsc;

use crate::adapters::{FsPrivateStorageAdapter, TracingLogAdapter};
use crate::app::controller::{ControllerOptions, ControllerPorts, ScreenController};
use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;

/// Bytes the fake engine writes to every output
pub(crate) const TRANSFORMED_BYTES: &[u8] = b"transformed video bytes";

pub(crate) struct FakePicker {
    pub(crate) next: Mutex<Option<ContentRef>>,
    pub(crate) calls: Mutex<u32>,
}

#[async_trait]
impl PickerPort for FakePicker {
    async fn browse(&self) -> Result<Vec<ContentRef>, DomainError> {
        Ok(self.next.lock().unwrap().iter().cloned().collect())
    }

    async fn pick(&self, request: &PickRequest) -> Result<Option<ContentRef>, DomainError> {
        *self.calls.lock().unwrap() += 1;
        if request.query.is_none() {
            return Ok(None);
        }
        Ok(self.next.lock().unwrap().clone())
    }
}

struct FakePlayer {
    released: Arc<AtomicBool>,
}

impl PlayerSession for FakePlayer {
    fn release(&mut self) {
        self.released.store(true, Ordering::SeqCst);
    }

    fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
pub(crate) struct FakePlayback {
    pub(crate) opened: Mutex<Vec<(ContentRef, u64, Arc<AtomicBool>)>>,
    /// When set, every opened player reports ready with this duration
    pub(crate) auto_ready_ms: Mutex<Option<u64>>,
}

impl FakePlayback {
    pub(crate) fn last(&self) -> (ContentRef, u64, Arc<AtomicBool>) {
        self.opened.lock().unwrap().last().cloned().unwrap()
    }

    pub(crate) fn open_count(&self) -> usize {
        self.opened.lock().unwrap().len()
    }
}

impl PlaybackPort for FakePlayback {
    fn open(
        &self,
        source: &ContentRef,
        generation: u64,
        events: EventSink,
    ) -> Result<Box<dyn PlayerSession>, DomainError> {
        let released = Arc::new(AtomicBool::new(false));
        self.opened
            .lock()
            .unwrap()
            .push((source.clone(), generation, Arc::clone(&released)));
        if let Some(duration_ms) = *self.auto_ready_ms.lock().unwrap() {
            let _ = events.send(UiEvent::Playback(PlaybackEvent::Ready {
                generation,
                duration_ms,
            }));
        }
        Ok(Box::new(FakePlayer { released }))
    }
}

#[derive(Clone, Copy, PartialEq)]
pub(crate) enum TransformMode {
    Succeed,
    Fail,
    WaitForCancel,
}

pub(crate) struct FakeTransform {
    pub(crate) mode: Mutex<TransformMode>,
    pub(crate) requests: Mutex<Vec<TransformRequest>>,
}

#[async_trait]
impl TransformPort for FakeTransform {
    async fn transform(
        &self,
        request: &TransformRequest,
        cancel: CancelFlag,
    ) -> Result<TransformReport, DomainError> {
        self.requests.lock().unwrap().push(request.clone());
        let mode = *self.mode.lock().unwrap();
        match mode {
            TransformMode::Succeed => {
                if let Some(parent) = request.output_path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(&request.output_path, TRANSFORMED_BYTES)?;
                Ok(TransformReport {
                    output_path: request.output_path.clone(),
                    frames_written: 30,
                    processing_time: Duration::from_millis(5),
                })
            }
            TransformMode::Fail => Err(DomainError::ProcessingError("codec exploded".to_string())),
            TransformMode::WaitForCancel => {
                while !cancel.load(Ordering::SeqCst) {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                }
                Err(DomainError::Cancelled)
            }
        }
    }
}

#[derive(Default)]
pub(crate) struct MemoryGallery {
    pub(crate) rows: Mutex<HashMap<String, GalleryEntry>>,
    bytes: Mutex<HashMap<String, Arc<Mutex<Vec<u8>>>>>,
}

struct SharedSink(Arc<Mutex<Vec<u8>>>);

impl Write for SharedSink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl GalleryPort for MemoryGallery {
    fn insert(&self, meta: &GalleryEntryMeta) -> Result<GalleryEntry, DomainError> {
        let mut rows = self.rows.lock().unwrap();
        let entry = GalleryEntry {
            id: format!("row-{}", rows.len()),
            meta: meta.clone(),
            is_pending: true,
            created_at: chrono::Utc::now(),
            size: 0,
        };
        rows.insert(entry.id.clone(), entry.clone());
        Ok(entry)
    }

    fn open_output(&self, id: &str) -> Result<Box<dyn Write + Send>, DomainError> {
        let sink = Arc::new(Mutex::new(Vec::new()));
        self.bytes.lock().unwrap().insert(id.to_string(), Arc::clone(&sink));
        Ok(Box::new(SharedSink(sink)))
    }

    fn finalize(&self, id: &str) -> Result<GalleryEntry, DomainError> {
        let size = self
            .bytes
            .lock()
            .unwrap()
            .get(id)
            .map(|b| b.lock().unwrap().len() as u64)
            .unwrap_or(0);
        let mut rows = self.rows.lock().unwrap();
        let entry = rows
            .get_mut(id)
            .ok_or_else(|| DomainError::FileNotFound(id.to_string()))?;
        entry.is_pending = false;
        entry.size = size;
        Ok(entry.clone())
    }

    fn delete(&self, id: &str) -> Result<(), DomainError> {
        self.rows.lock().unwrap().remove(id);
        self.bytes.lock().unwrap().remove(id);
        Ok(())
    }

    fn list_visible(&self) -> Result<Vec<GalleryEntry>, DomainError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|e| !e.is_pending)
            .cloned()
            .collect())
    }
}

pub(crate) struct FakePermissions {
    pub(crate) checked: Mutex<HashMap<&'static str, PermissionState>>,
    pub(crate) requested: Mutex<HashMap<&'static str, PermissionState>>,
    pub(crate) requests: Mutex<u32>,
}

fn access_key(access: StorageAccess) -> &'static str {
    match access {
        StorageAccess::Read => "read",
        StorageAccess::Write => "write",
    }
}

#[async_trait]
impl PermissionPort for FakePermissions {
    async fn check(&self, access: StorageAccess) -> PermissionState {
        self.checked
            .lock()
            .unwrap()
            .get(access_key(access))
            .copied()
            .unwrap_or(PermissionState::Granted)
    }

    async fn request(&self, access: StorageAccess) -> PermissionState {
        *self.requests.lock().unwrap() += 1;
        self.requested
            .lock()
            .unwrap()
            .get(access_key(access))
            .copied()
            .unwrap_or(PermissionState::Granted)
    }
}

#[derive(Default)]
pub(crate) struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub(crate) fn messages(&self) -> Vec<String> {
        self.notices.lock().unwrap().iter().map(|n| n.message.clone()).collect()
    }

    pub(crate) fn errors(&self) -> Vec<String> {
        self.notices
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.level == NoticeLevel::Error)
            .map(|n| n.message.clone())
            .collect()
    }
}

impl NotifierPort for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }
}

/// One set of fakes plus a scratch directory for videos and private storage
pub(crate) struct Fakes {
    pub(crate) picker: Arc<FakePicker>,
    pub(crate) playback: Arc<FakePlayback>,
    pub(crate) transform: Arc<FakeTransform>,
    pub(crate) gallery: Arc<MemoryGallery>,
    pub(crate) permissions: Arc<FakePermissions>,
    pub(crate) notifier: Arc<RecordingNotifier>,
    pub(crate) dir: TempDir,
}

impl Fakes {
    pub(crate) fn new() -> Self {
        Self {
            picker: Arc::new(FakePicker {
                next: Mutex::new(None),
                calls: Mutex::new(0),
            }),
            playback: Arc::new(FakePlayback::default()),
            transform: Arc::new(FakeTransform {
                mode: Mutex::new(TransformMode::Succeed),
                requests: Mutex::new(Vec::new()),
            }),
            gallery: Arc::new(MemoryGallery::default()),
            permissions: Arc::new(FakePermissions {
                checked: Mutex::new(HashMap::new()),
                requested: Mutex::new(HashMap::new()),
                requests: Mutex::new(0),
            }),
            notifier: Arc::new(RecordingNotifier::default()),
            dir: TempDir::new().unwrap(),
        }
    }

    /// Controller wired to these fakes, with the receiving end of its events
    pub(crate) fn controller(&self) -> (ScreenController, mpsc::UnboundedReceiver<UiEvent>) {
        let ports = ControllerPorts {
            picker: self.picker.clone(),
            playback: self.playback.clone(),
            transform: self.transform.clone(),
            storage: Arc::new(FsPrivateStorageAdapter::new(self.dir.path().join("private"))),
            gallery: self.gallery.clone(),
            permissions: self.permissions.clone(),
            notifier: self.notifier.clone(),
            log: Arc::new(TracingLogAdapter::new(LogLevel::Debug)),
        };
        let (tx, events) = mpsc::unbounded_channel();
        (ScreenController::new(ports, ControllerOptions::default(), tx), events)
    }

    /// Write a small file standing in for a video
    pub(crate) fn video(&self, name: &str) -> ContentRef {
        let path = self.dir.path().join(name);
        std::fs::write(&path, b"fake video bytes").unwrap();
        ContentRef::from_path(&path)
    }

    pub(crate) fn set_mode(&self, mode: TransformMode) {
        *self.transform.mode.lock().unwrap() = mode;
    }
}

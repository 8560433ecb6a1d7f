// Screen controller - Owns the editing session and maps user intents onto ports
//
// Every method runs on the session task. Long jobs are spawned and report back
// through the event sink; their results are applied in `handle_event`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::app::save_interactor::SaveInteractor;
use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::rules::*;
use crate::ports::*;


/// Collaborators the controller talks to
#[derive(Clone)]
pub struct ControllerPorts {
    pub picker: Arc<dyn PickerPort>,
    pub playback: Arc<dyn PlaybackPort>,
    pub transform: Arc<dyn TransformPort>,
    pub storage: Arc<dyn PrivateStoragePort>,
    pub gallery: Arc<dyn GalleryPort>,
    pub permissions: Arc<dyn PermissionPort>,
    pub notifier: Arc<dyn NotifierPort>,
    pub log: Arc<dyn LogPort>,
}

/// Tunables resolved from configuration
#[derive(Debug, Clone)]
pub struct ControllerOptions {
    /// Gallery folder new entries are registered under
    pub gallery_folder: String,
    /// Contrast factor of the high-contrast filter
    pub contrast: f32,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            gallery_folder: "Movies/VideoEditor".to_string(),
            contrast: 2.0,
        }
    }
}

/// The single outstanding job
#[derive(Debug, Clone)]
struct ActiveJob {
    id: u64,
    kind: JobKind,
    cancel: CancelFlag,
}

/// Preview player state for the current source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStatus {
    Idle,
    Preparing,
    Ready,
    Failed,
}

/// Snapshot of what the screen shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenState {
    pub phase: SessionPhase,
    pub source: Option<String>,
    pub duration_ms: u64,
    pub start_ms: u64,
    pub end_ms: u64,
    pub start_label: String,
    pub end_label: String,
    pub start_position: u8,
    pub end_position: u8,
    pub trim_panel_visible: bool,
    pub empty_state_visible: bool,
    pub active_job: Option<JobKind>,
}

/// Controller for the single editing screen
pub struct ScreenController {
    ports: ControllerPorts,
    options: ControllerOptions,
    events: EventSink,
    save_interactor: Arc<SaveInteractor>,

    source: Option<ContentRef>,
    player: Option<Box<dyn PlayerSession>>,
    playback: PlaybackStatus,
    generation: u64,
    duration_ms: u64,

    start_ms: u64,
    end_ms: u64,
    start_position: SliderPosition,
    end_position: SliderPosition,
    trim_panel_visible: bool,
    empty_state_visible: bool,

    active: Option<ActiveJob>,
    next_job_id: u64,
    last_failure: Option<String>,
    /// Set by `teardown`; late results are no longer applied
    torn_down: bool,
}

impl ScreenController {
    pub fn new(ports: ControllerPorts, options: ControllerOptions, events: EventSink) -> Self {
        let save_interactor = Arc::new(SaveInteractor::new(
            Arc::clone(&ports.storage),
            Arc::clone(&ports.gallery),
            options.gallery_folder.clone(),
        ));

        Self {
            ports,
            options,
            events,
            save_interactor,
            source: None,
            player: None,
            playback: PlaybackStatus::Idle,
            generation: 0,
            duration_ms: 0,
            start_ms: 0,
            end_ms: 0,
            start_position: SliderPosition::ZERO,
            end_position: SliderPosition::FULL,
            trim_panel_visible: false,
            empty_state_visible: true,
            active: None,
            next_job_id: 1,
            last_failure: None,
            torn_down: false,
        }
    }

    // ---- queries ----

    pub fn source(&self) -> Option<&ContentRef> {
        self.source.as_ref()
    }

    pub fn phase(&self) -> SessionPhase {
        match (&self.source, &self.active) {
            (None, _) => SessionPhase::Empty,
            (Some(_), Some(_)) => SessionPhase::Exporting,
            (Some(_), None) if self.duration_ms > 0 => SessionPhase::Previewing,
            (Some(_), None) => SessionPhase::HasSource,
        }
    }

    pub fn playback_status(&self) -> PlaybackStatus {
        self.playback
    }

    pub fn is_busy(&self) -> bool {
        self.active.is_some()
    }

    /// True while a job or a player preparation is still due to report back
    pub fn is_settling(&self) -> bool {
        self.is_busy() || self.playback == PlaybackStatus::Preparing
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    pub fn trim_bounds(&self) -> (u64, u64) {
        (self.start_ms, self.end_ms)
    }

    /// `mm:ss` labels shown next to the trim sliders
    pub fn labels(&self) -> (String, String) {
        (format_clock(self.start_ms), format_clock(self.end_ms))
    }

    pub fn trim_panel_visible(&self) -> bool {
        self.trim_panel_visible
    }

    pub fn empty_state_visible(&self) -> bool {
        self.empty_state_visible
    }

    /// Take the last error notice raised since the previous call
    pub fn take_failure(&mut self) -> Option<String> {
        self.last_failure.take()
    }

    pub fn state(&self) -> ScreenState {
        let (start_label, end_label) = self.labels();
        ScreenState {
            phase: self.phase(),
            source: self.source.as_ref().map(|s| s.to_string()),
            duration_ms: self.duration_ms,
            start_ms: self.start_ms,
            end_ms: self.end_ms,
            start_label,
            end_label,
            start_position: self.start_position.value(),
            end_position: self.end_position.value(),
            trim_panel_visible: self.trim_panel_visible,
            empty_state_visible: self.empty_state_visible,
            active_job: self.active.as_ref().map(|job| job.kind),
        }
    }

    // ---- intents ----

    /// List candidate videos from the picker's folders
    pub async fn browse(&mut self) -> Vec<ContentRef> {
        if !self.ensure_permission(StorageAccess::Read).await {
            return Vec::new();
        }
        match self.ports.picker.browse().await {
            Ok(listing) => listing,
            Err(e) => {
                self.notify_error(e.to_string());
                Vec::new()
            }
        }
    }

    /// Ask the picker for a video; `query` is a path or a browse index
    pub async fn pick(&mut self, query: Option<String>) {
        if self.reject_if_busy() {
            return;
        }
        if !self.ensure_permission(StorageAccess::Read).await {
            return;
        }

        let picked = match self.ports.picker.pick(&PickRequest::new(query)).await {
            Ok(Some(picked)) => picked,
            Ok(None) => {
                tracing::debug!("Pick cancelled");
                return;
            }
            Err(e) => {
                self.notify_error(e.to_string());
                return;
            }
        };

        self.ports
            .log
            .log_event(&LogEvent::new(LogLevel::Info, "Video selected").with("source", &picked))
            .await;
        self.empty_state_visible = false;
        self.replace_source(picked);
    }

    pub fn toggle_trim_panel(&mut self) -> bool {
        self.trim_panel_visible = !self.trim_panel_visible;
        self.trim_panel_visible
    }

    /// Record a slider move. Ignored until the duration is known.
    pub fn update_trim_bound(&mut self, bound: TrimBound, position: SliderPosition) {
        if self.duration_ms == 0 {
            tracing::debug!("Ignoring {:?} slider move, duration unknown", bound);
            return;
        }
        let ms = TrimRules::bound_from_position(position, self.duration_ms);
        match bound {
            TrimBound::Start => {
                self.start_ms = ms;
                self.start_position = position;
            }
            TrimBound::End => {
                self.end_ms = ms;
                self.end_position = position;
            }
        }
    }

    pub async fn apply_trim(&mut self) {
        let Some(source) = self.require_source() else {
            return;
        };
        let range = match TrimRules::validate(self.start_ms, self.end_ms) {
            Ok(range) => range,
            Err(_) => {
                self.notify_error(Messages::START_BEFORE_END);
                return;
            }
        };
        if self.reject_if_busy() {
            return;
        }

        self.start_transform(JobKind::Trim, source, Some(range), Vec::new())
            .await;
    }

    pub async fn apply_filter(&mut self, filter: FilterKind) {
        let Some(source) = self.require_source() else {
            return;
        };
        if self.reject_if_busy() {
            return;
        }

        let effects = filter.effects(self.options.contrast);
        self.ports
            .log
            .info(&format!("Applying filter {} ({} effects)", filter, effects.len()))
            .await;
        self.start_transform(JobKind::Filter, source, None, effects)
            .await;
    }

    pub async fn save(&mut self) {
        let Some(source) = self.require_source() else {
            return;
        };
        if self.reject_if_busy() {
            return;
        }
        if !self.ensure_permission(StorageAccess::Write).await {
            return;
        }

        let job = self.begin_job(JobKind::Save);
        let interactor = Arc::clone(&self.save_interactor);
        let events = self.events.clone();

        tokio::spawn(async move {
            let cancel = job.cancel.clone();
            let result = tokio::task::spawn_blocking(move || interactor.execute(&source, &cancel))
                .await
                .unwrap_or_else(|e| Err(DomainError::InternalError(format!("Save worker failed: {}", e))));
            let _ = events.send(UiEvent::SaveFinished {
                job_id: job.id,
                result,
            });
        });
    }

    /// Ask the outstanding job to stop
    pub fn cancel(&mut self) -> bool {
        match &self.active {
            Some(job) => {
                tracing::info!("Cancelling {} job {}", job.kind, job.id);
                job.cancel.store(true, Ordering::SeqCst);
                true
            }
            None => {
                self.ports.notifier.notify(Notice::info(Messages::NOTHING_TO_CANCEL));
                false
            }
        }
    }

    /// Stop outstanding work and release the player. Safe to call repeatedly.
    ///
    /// After teardown, job results only clear the busy state; no new player is opened.
    pub fn teardown(&mut self) {
        self.torn_down = true;
        if let Some(job) = &self.active {
            job.cancel.store(true, Ordering::SeqCst);
        }
        if let Some(mut player) = self.player.take() {
            player.release();
        }
        self.playback = PlaybackStatus::Idle;
    }

    // ---- events ----

    /// Apply a result posted by a player or a job
    pub async fn handle_event(&mut self, event: UiEvent) {
        match event {
            UiEvent::Playback(PlaybackEvent::Ready {
                generation,
                duration_ms,
            }) => {
                if !self.is_current(generation) {
                    tracing::debug!("Ignoring ready from stale player {}", generation);
                    return;
                }
                self.playback = PlaybackStatus::Ready;
                self.duration_ms = duration_ms;
                self.end_ms = duration_ms;
                self.end_position = SliderPosition::FULL;
                tracing::info!("Preview ready, duration {}", format_clock(duration_ms));
            }
            UiEvent::Playback(PlaybackEvent::Failed {
                generation,
                message,
            }) => {
                if !self.is_current(generation) {
                    return;
                }
                self.playback = PlaybackStatus::Failed;
                self.notify_error(format!("{}: {}", Messages::PLAYBACK_FAILED, message));
            }
            UiEvent::TransformFinished {
                job_id,
                kind,
                result,
            } => {
                if !self.finish_job(job_id) {
                    return;
                }
                if self.torn_down {
                    tracing::info!("Discarding {} result after teardown: {:?}", kind, result.map(|r| r.output_path));
                    return;
                }
                match result {
                    Ok(report) => {
                        self.ports
                            .log
                            .log_event(
                                &LogEvent::new(LogLevel::Info, "Transform completed")
                                    .with("kind", kind)
                                    .with("output", report.output_path.display())
                                    .with("frames", report.frames_written),
                            )
                            .await;
                        self.replace_source(ContentRef::from_path(&report.output_path));
                        self.ports.notifier.notify(Notice::info(Messages::succeeded(kind)));
                    }
                    Err(e) => self.report_job_failure(kind, &e).await,
                }
            }
            UiEvent::SaveFinished { job_id, result } => {
                if !self.finish_job(job_id) {
                    return;
                }
                if self.torn_down {
                    tracing::info!("Save finished after teardown: {:?}", result.map(|entry| entry.id));
                    return;
                }
                match result {
                    Ok(entry) => {
                        self.ports
                            .log
                            .info(&format!("Gallery entry {} published", entry.id))
                            .await;
                        self.ports.notifier.notify(Notice::info(Messages::SAVE_DONE));
                    }
                    Err(e) => self.report_job_failure(JobKind::Save, &e).await,
                }
            }
        }
    }

    // ---- internals ----

    fn is_current(&self, generation: u64) -> bool {
        generation == self.generation && self.player.is_some()
    }

    fn require_source(&mut self) -> Option<ContentRef> {
        let source = self.source.clone();
        if source.is_none() {
            self.notify_error(Messages::SELECT_VIDEO_FIRST);
        }
        source
    }

    fn reject_if_busy(&mut self) -> bool {
        if let Some(job) = &self.active {
            tracing::debug!("Rejected intent while {} job {} runs", job.kind, job.id);
            self.notify_error(Messages::OPERATION_IN_PROGRESS);
            return true;
        }
        false
    }

    /// Check access, asking once more if it is missing
    async fn ensure_permission(&mut self, access: StorageAccess) -> bool {
        let permissions = Arc::clone(&self.ports.permissions);
        if permissions.check(access).await == PermissionState::Granted {
            return true;
        }
        if permissions.request(access).await == PermissionState::Granted {
            return true;
        }

        let message = match access {
            StorageAccess::Read => Messages::READ_PERMISSION_REQUIRED,
            StorageAccess::Write => Messages::WRITE_PERMISSION_REQUIRED,
        };
        self.ports.log.warn(message).await;
        self.notify_error(message);
        false
    }

    /// Point the session at new content and prepare a fresh player for it
    fn replace_source(&mut self, source: ContentRef) {
        self.source = Some(source);
        self.start_ms = 0;
        self.end_ms = 0;
        self.start_position = SliderPosition::ZERO;
        self.end_position = SliderPosition::FULL;
        self.init_playback();
    }

    fn init_playback(&mut self) {
        if let Some(mut player) = self.player.take() {
            player.release();
        }
        self.duration_ms = 0;
        self.generation += 1;

        let Some(source) = self.source.clone() else {
            self.playback = PlaybackStatus::Idle;
            return;
        };
        match self
            .ports
            .playback
            .open(&source, self.generation, self.events.clone())
        {
            Ok(player) => {
                self.player = Some(player);
                self.playback = PlaybackStatus::Preparing;
            }
            Err(e) => {
                self.playback = PlaybackStatus::Failed;
                self.notify_error(Messages::failure(Messages::PLAYBACK_FAILED, &e));
            }
        }
    }

    fn begin_job(&mut self, kind: JobKind) -> ActiveJob {
        let job = ActiveJob {
            id: self.next_job_id,
            kind,
            cancel: Arc::new(AtomicBool::new(false)),
        };
        self.next_job_id += 1;
        self.active = Some(job.clone());
        self.last_failure = None;
        self.ports.notifier.notify(Notice::info(Messages::started(kind)));
        job
    }

    async fn start_transform(
        &mut self,
        kind: JobKind,
        input: ContentRef,
        trim: Option<TrimRange>,
        effects: Vec<EffectDescriptor>,
    ) {
        let output_path = OutputNaming::working_file(
            &self.ports.storage.working_dir(),
            kind,
            OutputNaming::timestamp_millis(),
        );
        let job = self.begin_job(kind);
        let request = TransformRequest {
            job_id: job.id,
            kind,
            input,
            output_path,
            trim,
            effects,
            video_mime: VIDEO_MP4_MIME.to_string(),
        };

        self.ports
            .log
            .log_event(
                &LogEvent::new(LogLevel::Info, "Transform started")
                    .with("job", job.id)
                    .with("kind", kind)
                    .with("output", request.output_path.display()),
            )
            .await;

        let transform = Arc::clone(&self.ports.transform);
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = transform.transform(&request, job.cancel).await;
            let _ = events.send(UiEvent::TransformFinished {
                job_id: job.id,
                kind,
                result,
            });
        });
    }

    /// Clear the outstanding job if `job_id` is it
    fn finish_job(&mut self, job_id: u64) -> bool {
        match &self.active {
            Some(job) if job.id == job_id => {
                self.active = None;
                true
            }
            _ => {
                tracing::warn!("Ignoring result of unknown job {}", job_id);
                false
            }
        }
    }

    async fn report_job_failure(&mut self, kind: JobKind, error: &DomainError) {
        self.ports
            .log
            .error(&format!("{} job failed: {}", kind, error))
            .await;
        if *error == DomainError::Cancelled {
            self.notify_error(Messages::CANCELLED);
        } else {
            self.notify_error(Messages::failure(Messages::failed(kind), error));
        }
    }

    fn notify_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        self.last_failure = Some(message.clone());
        self.ports.notifier.notify(Notice::error(message).long());
    }
}

impl Drop for ScreenController {
    fn drop(&mut self) {
        self.teardown();
    }
}

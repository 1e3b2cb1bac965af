//! Upload lifecycle: idle → file selected → uploading → completed or failed.
//!
//! All state lives behind one mutex. Every timer callback and the request
//! settlement re-check the session id under that mutex, so once a session is
//! settled, superseded or reset nothing scheduled for it can touch the view.

use std::{path::Path, sync::Arc};

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use shared::domain::{ReportSummary, SelectedFile};
use tokio::{
    sync::{broadcast, Mutex, MutexGuard},
    time::{Instant, MissedTickBehavior},
};
use tracing::{debug, info, warn};

use crate::{
    artifact::{ArtifactStore, ResultArtifact},
    error::UploadError,
    events::ControllerEvent,
    notification::{Notification, NotificationKind, Notifier},
    progress::{ProgressSimulation, ProgressTimers, ProgressView, TimerCounts, TICK_INTERVAL},
    response::classify_response,
    UploadTransport,
};

const EVENT_CAPACITY: usize = 256;
pub const SUCCESS_MESSAGE: &str = "Report generated successfully!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadPhase {
    Idle,
    FileSelected,
    Uploading,
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultView {
    pub artifact: ResultArtifact,
    pub summary: ReportSummary,
}

/// Everything a front end renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewState {
    pub phase: UploadPhase,
    pub file_name: Option<String>,
    pub submit_enabled: bool,
    pub progress: Option<ProgressView>,
    pub error: Option<String>,
    pub result: Option<ResultView>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            phase: UploadPhase::Idle,
            file_name: None,
            submit_enabled: false,
            progress: None,
            error: None,
            result: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Completed(ResultView),
    /// A newer submit or a reset took over before the response arrived.
    Superseded,
}

#[derive(Default)]
struct ControllerState {
    selected: Option<SelectedFile>,
    view: ViewState,
    next_session: u64,
    active_session: Option<u64>,
    progress: Option<ProgressSimulation>,
    timers: ProgressTimers,
    artifacts: ArtifactStore,
}

impl ControllerState {
    fn is_live(&self, session: u64) -> bool {
        self.active_session == Some(session)
    }

    fn sync_progress_view(&mut self) {
        self.view.progress = self.progress.as_ref().map(ProgressSimulation::view);
    }

    /// Drops the live session, its timers and its progress panel.
    fn end_session(&mut self) {
        self.active_session = None;
        self.timers.cancel();
        self.progress = None;
        self.view.progress = None;
    }
}

pub struct UploadController<T> {
    transport: Arc<T>,
    state: Arc<Mutex<ControllerState>>,
    notifier: Notifier,
    events: broadcast::Sender<ControllerEvent>,
}

impl<T> Clone for UploadController<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            state: Arc::clone(&self.state),
            notifier: self.notifier.clone(),
            events: self.events.clone(),
        }
    }
}

impl<T: UploadTransport> UploadController<T> {
    pub fn new(transport: T) -> Self {
        Self::with_transport(Arc::new(transport))
    }

    pub fn with_transport(transport: Arc<T>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            transport,
            state: Arc::new(Mutex::new(ControllerState::default())),
            notifier: Notifier::new(events.clone()),
            events,
        }
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ControllerEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> ViewState {
        self.state.lock().await.view.clone()
    }

    pub async fn notification(&self) -> Option<Notification> {
        self.notifier.current().await
    }

    pub async fn has_selected_file(&self) -> bool {
        self.state.lock().await.selected.is_some()
    }

    pub async fn timer_counts(&self) -> TimerCounts {
        self.state.lock().await.timers.counts()
    }

    /// Progress timers plus the notification dismissal timer.
    pub async fn pending_timers(&self) -> usize {
        let progress = self.timer_counts().await.total();
        progress + self.notifier.pending_timers().await
    }

    pub async fn select_file(&self, file: Option<SelectedFile>) {
        let Some(file) = file else {
            self.reset().await;
            return;
        };

        debug!(file = %file.name, size_bytes = file.size_bytes(), "file selected");
        let view = {
            let mut state = self.state.lock().await;
            state.view.file_name = Some(file.name.clone());
            state.view.submit_enabled = true;
            if state.view.phase != UploadPhase::Uploading {
                state.view.phase = UploadPhase::FileSelected;
            }
            state.selected = Some(file);
            state.view.clone()
        };
        self.emit_view(view);
    }

    pub async fn submit(&self) -> Result<SubmitOutcome, UploadError> {
        let mut state = self.state.lock().await;

        if let Some(previous) = state.active_session {
            debug!(session = previous, "abandoning in-flight upload session");
        }
        state.end_session();
        state.artifacts.revoke_all();
        state.view.error = None;
        state.view.result = None;

        let Some(file) = state.selected.clone() else {
            state.view.submit_enabled = false;
            return self.fail(state, UploadError::Validation).await;
        };

        state.next_session += 1;
        let session = state.next_session;
        state.active_session = Some(session);
        state.progress = Some(ProgressSimulation::new());
        state.sync_progress_view();
        state.view.phase = UploadPhase::Uploading;

        let tick = tokio::spawn(run_progress_ticks(
            Arc::clone(&self.state),
            self.events.clone(),
            session,
        ));
        let stage_advance = tokio::spawn(run_stage_advance(
            Arc::clone(&self.state),
            self.events.clone(),
            session,
        ));
        state.timers.arm(tick, stage_advance);

        let view = state.view.clone();
        drop(state);
        self.emit_view(view);
        info!(session, file = %file.name, "upload started");

        let response = self.transport.upload(&file).await;

        let mut state = self.state.lock().await;
        if !state.is_live(session) {
            debug!(session, "discarding result of superseded upload session");
            return Ok(SubmitOutcome::Superseded);
        }
        state.active_session = None;
        state.timers.cancel();

        let response = match response {
            Ok(response) => response,
            Err(err) => {
                state.end_session();
                return self.fail(state, UploadError::Network(err.to_string())).await;
            }
        };

        if let Some(progress) = state.progress.as_mut() {
            progress.complete();
        }
        state.sync_progress_view();
        self.emit_view(state.view.clone());

        let completed = match classify_response(response) {
            Ok(completed) => completed,
            Err(err) => {
                state.end_session();
                return self.fail(state, err).await;
            }
        };

        let artifact = state
            .artifacts
            .register(completed.payload, completed.content_type);
        let result = ResultView {
            artifact,
            summary: completed.summary,
        };
        // The 100% frame has gone out; the result panel replaces the bar.
        state.end_session();
        state.view.result = Some(result.clone());
        state.view.phase = UploadPhase::Completed;
        self.emit_view(state.view.clone());
        info!(
            session,
            size_bytes = result.artifact.size_bytes,
            total = ?result.summary.total,
            "report ready"
        );
        // Toasts change only under the state lock; reset dismisses under it too.
        self.notifier
            .show(NotificationKind::Success, SUCCESS_MESSAGE)
            .await;
        drop(state);
        Ok(SubmitOutcome::Completed(result))
    }

    pub async fn reset(&self) {
        let mut state = self.state.lock().await;
        state.end_session();
        state.selected = None;
        let revoked = state.artifacts.revoke_all();
        if revoked > 0 {
            debug!(revoked, "revoked report artifacts");
        }
        state.view = ViewState::default();
        self.emit_view(state.view.clone());
        self.notifier.dismiss().await;
    }

    pub async fn artifact_bytes(&self, url: &str) -> Option<Arc<Vec<u8>>> {
        self.state.lock().await.artifacts.bytes(url)
    }

    /// Writes a ready report to disk and returns the number of bytes written.
    pub async fn save_artifact(&self, url: &str, path: impl AsRef<Path>) -> Result<u64> {
        let path = path.as_ref();
        let bytes = self
            .artifact_bytes(url)
            .await
            .ok_or_else(|| anyhow!("report {url} is no longer available"))?;
        tokio::fs::write(path, bytes.as_slice())
            .await
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        info!(path = %path.display(), "report saved");
        Ok(bytes.len() as u64)
    }

    async fn fail(
        &self,
        mut state: MutexGuard<'_, ControllerState>,
        err: UploadError,
    ) -> Result<SubmitOutcome, UploadError> {
        let message = err.user_message();
        state.view.error = Some(message.clone());
        state.view.phase = UploadPhase::Failed;

        warn!("upload failed: {err}");
        self.emit_view(state.view.clone());
        self.notifier.show(NotificationKind::Error, message).await;
        drop(state);
        Err(err)
    }

    fn emit_view(&self, view: ViewState) {
        let _ = self.events.send(ControllerEvent::View(view));
    }
}

async fn run_progress_ticks(
    state: Arc<Mutex<ControllerState>>,
    events: broadcast::Sender<ControllerEvent>,
    session: u64,
) {
    let mut interval = tokio::time::interval_at(Instant::now() + TICK_INTERVAL, TICK_INTERVAL);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        interval.tick().await;
        let mut guard = state.lock().await;
        if !guard.is_live(session) {
            debug!(session, "stale progress tick");
            return;
        }
        let Some(progress) = guard.progress.as_mut() else {
            return;
        };
        if progress.tick() {
            guard.sync_progress_view();
            let _ = events.send(ControllerEvent::View(guard.view.clone()));
        }
    }
}

async fn run_stage_advance(
    state: Arc<Mutex<ControllerState>>,
    events: broadcast::Sender<ControllerEvent>,
    session: u64,
) {
    loop {
        let dwell = {
            let guard = state.lock().await;
            if !guard.is_live(session) {
                return;
            }
            match guard.progress.as_ref() {
                Some(progress) if !progress.is_final_stage() => progress.stage().dwell,
                _ => return,
            }
        };

        tokio::time::sleep(dwell).await;

        let mut guard = state.lock().await;
        if !guard.is_live(session) {
            debug!(session, "stale stage advance");
            return;
        }
        let Some(progress) = guard.progress.as_mut() else {
            return;
        };
        if !progress.advance_stage() {
            return;
        }
        debug!(session, stage = progress.label(), "progress stage advanced");
        guard.sync_progress_view();
        let _ = events.send(ControllerEvent::View(guard.view.clone()));
    }
}

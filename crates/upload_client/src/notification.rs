//! Transient toast-style notifications. At most one is visible; a new one
//! replaces the current one and restarts the dismissal timer.

use std::{sync::Arc, time::Duration};

use serde::Serialize;
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
};

use crate::events::ControllerEvent;

pub const DISPLAY_DURATION: Duration = Duration::from_millis(3000);
pub const FADE_DURATION: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationPhase {
    Visible,
    FadingOut,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub seq: u64,
    pub kind: NotificationKind,
    pub message: String,
    pub phase: NotificationPhase,
}

#[derive(Default)]
struct NotifierState {
    current: Option<Notification>,
    next_seq: u64,
    dismiss_timer: Option<JoinHandle<()>>,
}

#[derive(Clone)]
pub struct Notifier {
    state: Arc<Mutex<NotifierState>>,
    events: broadcast::Sender<ControllerEvent>,
}

impl Notifier {
    pub fn new(events: broadcast::Sender<ControllerEvent>) -> Self {
        Self {
            state: Arc::new(Mutex::new(NotifierState::default())),
            events,
        }
    }

    pub async fn show(&self, kind: NotificationKind, message: impl Into<String>) -> u64 {
        let notification = {
            let mut state = self.state.lock().await;
            if let Some(timer) = state.dismiss_timer.take() {
                timer.abort();
            }
            state.next_seq += 1;
            let notification = Notification {
                seq: state.next_seq,
                kind,
                message: message.into(),
                phase: NotificationPhase::Visible,
            };
            state.current = Some(notification.clone());

            let notifier = self.clone();
            let seq = notification.seq;
            state.dismiss_timer = Some(tokio::spawn(async move {
                notifier.run_dismissal(seq).await;
            }));
            notification
        };

        tracing::debug!(
            seq = notification.seq,
            kind = ?notification.kind,
            "showing notification"
        );
        let seq = notification.seq;
        let _ = self
            .events
            .send(ControllerEvent::Notification(Some(notification)));
        seq
    }

    pub async fn current(&self) -> Option<Notification> {
        self.state.lock().await.current.clone()
    }

    /// Removes the current notification immediately.
    pub async fn dismiss(&self) {
        let removed = {
            let mut state = self.state.lock().await;
            if let Some(timer) = state.dismiss_timer.take() {
                timer.abort();
            }
            state.current.take().is_some()
        };
        if removed {
            let _ = self.events.send(ControllerEvent::Notification(None));
        }
    }

    pub async fn pending_timers(&self) -> usize {
        let state = self.state.lock().await;
        usize::from(
            state
                .dismiss_timer
                .as_ref()
                .is_some_and(|timer| !timer.is_finished()),
        )
    }

    async fn run_dismissal(&self, seq: u64) {
        tokio::time::sleep(DISPLAY_DURATION).await;
        let fading = {
            let mut state = self.state.lock().await;
            match state.current.as_mut() {
                Some(current) if current.seq == seq => {
                    current.phase = NotificationPhase::FadingOut;
                    current.clone()
                }
                _ => return,
            }
        };
        let _ = self
            .events
            .send(ControllerEvent::Notification(Some(fading)));

        tokio::time::sleep(FADE_DURATION).await;
        {
            let mut state = self.state.lock().await;
            if state.current.as_ref().map(|current| current.seq) != Some(seq) {
                return;
            }
            state.current = None;
            // This task is the timer; detach its own handle.
            state.dismiss_timer = None;
        }
        let _ = self.events.send(ControllerEvent::Notification(None));
    }
}

//! Runtime bridge between UI command queue and the upload controller.

use std::{path::Path, thread};

use anyhow::Context;
use crossbeam_channel::{Receiver, Sender};
use shared::domain::SelectedFile;
use tokio::sync::{
    broadcast::{self, error::RecvError},
    watch,
};
use upload_client::{
    ControllerEvent, HttpUploadTransport, Notification, SubmitOutcome, UploadController,
    ViewState,
};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};

/// Latest controller view and toast. Each slot holds only the newest value,
/// so a UI that stops draining (minimized window) never loses the final state.
pub struct ControllerFeed {
    view: watch::Receiver<ViewState>,
    notification: watch::Receiver<Option<Notification>>,
}

impl ControllerFeed {
    pub fn latest_view(&mut self) -> Option<ViewState> {
        if !self.view.has_changed().unwrap_or(false) {
            return None;
        }
        Some(self.view.borrow_and_update().clone())
    }

    pub fn latest_notification(&mut self) -> Option<Option<Notification>> {
        if !self.notification.has_changed().unwrap_or(false) {
            return None;
        }
        Some(self.notification.borrow_and_update().clone())
    }
}

pub fn launch(
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
    server_url: String,
) -> ControllerFeed {
    let (view_tx, view_rx) = watch::channel(ViewState::default());
    let (notification_tx, notification_rx) = watch::channel(None);

    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("upload worker startup failure: failed to build runtime: {err}"),
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(async move {
            let transport = match HttpUploadTransport::new(&server_url) {
                Ok(transport) => transport,
                Err(err) => {
                    let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                        UiErrorContext::BackendStartup,
                        format!("{err:#}"),
                    )));
                    tracing::error!("unusable server url {server_url}: {err:#}");
                    return;
                }
            };
            tracing::info!(endpoint = %transport.endpoint(), "upload worker ready");

            let controller = UploadController::new(transport);
            tokio::spawn(forward_controller_events(
                controller.subscribe_events(),
                view_tx,
                notification_tx,
            ));

            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    BackendCommand::SelectFile { path } => match read_selected_file(&path).await {
                        Ok(file) => {
                            tracing::debug!(file = %file.name, bytes = file.size_bytes(), "file selected");
                            controller.select_file(Some(file)).await;
                        }
                        Err(err) => {
                            let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                                UiErrorContext::FileSelection,
                                format!("{err:#}"),
                            )));
                        }
                    },
                    BackendCommand::ClearFile => controller.reset().await,
                    BackendCommand::Submit => {
                        let controller = controller.clone();
                        tokio::spawn(async move {
                            match controller.submit().await {
                                Ok(SubmitOutcome::Completed(result)) => tracing::info!(
                                    bytes = result.artifact.size_bytes,
                                    "report ready"
                                ),
                                Ok(SubmitOutcome::Superseded) => {
                                    tracing::debug!("upload superseded")
                                }
                                Err(err) => tracing::warn!("upload failed: {err}"),
                            }
                        });
                    }
                    BackendCommand::SaveReport { url, path } => {
                        match controller.save_artifact(&url, &path).await {
                            Ok(written) => {
                                let _ = ui_tx.try_send(UiEvent::Info(format!(
                                    "Saved {written} bytes to {}",
                                    path.display()
                                )));
                            }
                            Err(err) => {
                                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                                    UiErrorContext::SaveReport,
                                    format!("{err:#}"),
                                )));
                            }
                        }
                    }
                }
            }

            controller.reset().await;
            tracing::info!("ui command queue closed; upload worker exiting");
        });
    });

    ControllerFeed {
        view: view_rx,
        notification: notification_rx,
    }
}

async fn read_selected_file(path: &Path) -> anyhow::Result<SelectedFile> {
    let content = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .with_context(|| format!("invalid file path {}", path.display()))?;
    Ok(SelectedFile::new(name, content))
}

async fn forward_controller_events(
    mut events: broadcast::Receiver<ControllerEvent>,
    view_tx: watch::Sender<ViewState>,
    notification_tx: watch::Sender<Option<Notification>>,
) {
    loop {
        match events.recv().await {
            Ok(ControllerEvent::View(view)) => {
                view_tx.send_replace(view);
            }
            Ok(ControllerEvent::Notification(notification)) => {
                notification_tx.send_replace(notification);
            }
            // Events are full snapshots; the newest ones are still queued.
            Err(RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "controller event forwarder lagged");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

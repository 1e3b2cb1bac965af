use std::{path::PathBuf, time::Duration};

use chrono::Local;
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use shared::protocol::ACCEPTED_EXTENSIONS;
use upload_client::{
    Notification, NotificationKind, NotificationPhase, ResultView, UploadPhase, ViewState,
};

use crate::backend_bridge::{commands::BackendCommand, runtime::ControllerFeed};
use crate::controller::events::{UiErrorCategory, UiEvent};
use crate::controller::orchestration::dispatch_backend_command;

pub struct StartupConfig {
    pub server_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusTone {
    Info,
    Error,
}

struct StatusBanner {
    tone: StatusTone,
    message: String,
}

pub struct UploaderApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    feed: ControllerFeed,
    server_url: String,
    view: ViewState,
    notification: Option<Notification>,
    status: String,
    status_banner: Option<StatusBanner>,
}

impl UploaderApp {
    pub fn new(
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        feed: ControllerFeed,
        startup: StartupConfig,
    ) -> Self {
        Self {
            cmd_tx,
            ui_rx,
            feed,
            server_url: startup.server_url,
            view: ViewState::default(),
            notification: None,
            status: "Choose a domain list to check".to_string(),
            status_banner: None,
        }
    }

    fn process_ui_events(&mut self) {
        if let Some(view) = self.feed.latest_view() {
            self.view = view;
        }
        if let Some(notification) = self.feed.latest_notification() {
            self.notification = notification;
        }

        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::Info(message) => {
                    self.status_banner = Some(StatusBanner {
                        tone: StatusTone::Info,
                        message: message.clone(),
                    });
                    self.status = message;
                }
                UiEvent::Error(err) => {
                    let prefix = match err.category() {
                        UiErrorCategory::Transport => "Connection problem",
                        UiErrorCategory::Filesystem => "File problem",
                        UiErrorCategory::Validation => "Invalid input",
                        UiErrorCategory::Unknown => "Error",
                    };
                    tracing::warn!(context = ?err.context(), "{}", err.message());
                    self.status = format!("{prefix}: {}", err.message());
                    self.status_banner = Some(StatusBanner {
                        tone: StatusTone::Error,
                        message: self.status.clone(),
                    });
                }
            }
        }
    }

    fn dispatch(&mut self, cmd: BackendCommand) {
        dispatch_backend_command(&self.cmd_tx, cmd, &mut self.status);
    }

    fn show_status_banner(&mut self, ui: &mut egui::Ui) {
        let Some(banner) = self.status_banner.as_ref() else {
            return;
        };
        let fill = match banner.tone {
            StatusTone::Info => egui::Color32::from_rgb(38, 92, 150),
            StatusTone::Error => egui::Color32::from_rgb(150, 45, 45),
        };
        let mut dismissed = false;
        egui::Frame::NONE
            .fill(fill)
            .corner_radius(8.0)
            .inner_margin(egui::Margin::symmetric(10, 8))
            .show(ui, |ui| {
                ui.horizontal_wrapped(|ui| {
                    ui.label(egui::RichText::new(&banner.message).color(egui::Color32::WHITE));
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("Dismiss").clicked() {
                            dismissed = true;
                        }
                    });
                });
            });
        if dismissed {
            self.status_banner = None;
        }
    }

    fn show_file_row(&mut self, ui: &mut egui::Ui) {
        let uploading = self.view.phase == UploadPhase::Uploading;
        let mut picked: Option<PathBuf> = None;
        let mut clear = false;
        let mut submit = false;

        ui.horizontal(|ui| {
            if ui
                .add_enabled(!uploading, egui::Button::new("Choose file..."))
                .clicked()
            {
                let mut dialog =
                    rfd::FileDialog::new().add_filter("Domain lists", ACCEPTED_EXTENSIONS);
                if let Some(dir) = default_pick_dir() {
                    dialog = dialog.set_directory(dir);
                }
                picked = dialog.pick_file();
            }

            match self.view.file_name.as_deref() {
                Some(name) => {
                    ui.label(egui::RichText::new(name).strong());
                }
                None => {
                    ui.label(egui::RichText::new("No file selected").weak());
                }
            }

            if self.view.file_name.is_some() && ui.small_button("Clear").clicked() {
                clear = true;
            }
        });

        ui.add_space(6.0);
        if ui
            .add_enabled(
                self.view.submit_enabled,
                egui::Button::new("Upload and check").min_size(egui::vec2(160.0, 28.0)),
            )
            .clicked()
        {
            submit = true;
        }

        if let Some(path) = picked {
            self.status = format!("Reading {}", path.display());
            self.dispatch(BackendCommand::SelectFile { path });
        }
        if clear {
            self.dispatch(BackendCommand::ClearFile);
        }
        if submit {
            self.status = "Uploading...".to_string();
            self.dispatch(BackendCommand::Submit);
        }
    }

    fn show_progress(&self, ui: &mut egui::Ui) {
        let Some(progress) = self.view.progress.as_ref() else {
            return;
        };
        ui.add_space(8.0);
        ui.add(
            egui::ProgressBar::new(progress.percent / 100.0)
                .show_percentage()
                .animate(self.view.phase == UploadPhase::Uploading),
        );
        ui.label(&progress.stage_label);
    }

    fn show_result(&mut self, ui: &mut egui::Ui) {
        let Some(result) = self.view.result.clone() else {
            return;
        };
        ui.add_space(10.0);
        let mut save_to: Option<PathBuf> = None;
        ui.group(|ui| {
            ui.heading("Report summary");
            egui::Grid::new("report_summary")
                .num_columns(2)
                .striped(true)
                .show(ui, |ui| {
                    for (label, value) in result.summary.display_rows() {
                        ui.label(label);
                        ui.label(egui::RichText::new(value).monospace());
                        ui.end_row();
                    }
                });
            ui.add_space(6.0);
            ui.label(artifact_caption(&result));
            if ui.button("Save report...").clicked() {
                let mut dialog = rfd::FileDialog::new()
                    .add_filter("Excel workbook", &["xlsx"])
                    .set_file_name(&result.artifact.filename);
                if let Some(dir) = dirs::download_dir().or_else(dirs::home_dir) {
                    dialog = dialog.set_directory(dir);
                }
                save_to = dialog.save_file();
            }
        });

        if let Some(path) = save_to {
            self.dispatch(BackendCommand::SaveReport {
                url: result.artifact.url,
                path,
            });
        }
    }

    fn show_notification(&self, ctx: &egui::Context) {
        let Some(notification) = self.notification.as_ref() else {
            return;
        };
        let base = match notification.kind {
            NotificationKind::Success => egui::Color32::from_rgb(46, 125, 50),
            NotificationKind::Error => egui::Color32::from_rgb(198, 40, 40),
            NotificationKind::Info => egui::Color32::from_rgb(38, 92, 150),
        };
        let opacity = match notification.phase {
            NotificationPhase::Visible => 1.0,
            NotificationPhase::FadingOut => 0.35,
        };

        egui::Area::new(egui::Id::new("upload_notification"))
            .anchor(egui::Align2::RIGHT_BOTTOM, egui::vec2(-16.0, -16.0))
            .interactable(false)
            .show(ctx, |ui| {
                egui::Frame::NONE
                    .fill(base.gamma_multiply(opacity))
                    .corner_radius(6.0)
                    .inner_margin(egui::Margin::symmetric(14, 10))
                    .show(ui, |ui| {
                        ui.label(
                            egui::RichText::new(&notification.message)
                                .color(egui::Color32::WHITE.gamma_multiply(opacity)),
                        );
                    });
            });
    }
}

impl eframe::App for UploaderApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new(&self.status).small());
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(egui::RichText::new(&self.server_url).small().weak());
                });
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Domain Checker");
            ui.label(format!(
                "Upload a domain list ({}) to get an Excel report.",
                ACCEPTED_EXTENSIONS
                    .iter()
                    .map(|ext| format!(".{ext}"))
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
            ui.add_space(8.0);
            self.show_status_banner(ui);
            ui.add_space(8.0);
            self.show_file_row(ui);
            self.show_progress(ui);
            if let Some(error) = self.view.error.as_deref() {
                ui.add_space(6.0);
                ui.colored_label(egui::Color32::from_rgb(198, 40, 40), error);
            }
            self.show_result(ui);
        });

        self.show_notification(ctx);

        if self.view.phase == UploadPhase::Uploading || self.notification.is_some() {
            ctx.request_repaint_after(Duration::from_millis(50));
        } else {
            ctx.request_repaint_after(Duration::from_millis(250));
        }
    }
}

fn default_pick_dir() -> Option<PathBuf> {
    dirs::document_dir()
        .or_else(dirs::desktop_dir)
        .or_else(dirs::home_dir)
}

fn artifact_caption(result: &ResultView) -> String {
    let created = result.artifact.created_at.with_timezone(&Local);
    format!(
        "{} ({}) generated {}",
        result.artifact.filename,
        human_readable_bytes(result.artifact.size_bytes),
        created.format("%Y-%m-%d %H:%M:%S")
    )
}

fn human_readable_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes < KB {
        return format!("{bytes} B");
    }
    if bytes < MB {
        return format_scaled_unit(bytes, KB, "KB");
    }
    format_scaled_unit(bytes, MB, "MB")
}

fn format_scaled_unit(bytes: u64, unit_size: u64, unit_label: &str) -> String {
    let value = bytes as f64 / unit_size as f64;
    let text = format!("{value:.1}");
    let compact = text.strip_suffix(".0").unwrap_or(&text);
    format!("{compact} {unit_label}")
}

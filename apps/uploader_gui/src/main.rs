use clap::Parser;
use crossbeam_channel::bounded;
use eframe::egui;
use tracing_subscriber::EnvFilter;

mod backend_bridge;
mod controller;
mod ui;

use backend_bridge::commands::BackendCommand;
use controller::events::UiEvent;
use ui::{StartupConfig, UploaderApp};

#[derive(Parser, Debug)]
#[command(about = "Desktop front end for the domain report server")]
struct Args {
    /// Report server root.
    #[arg(long, env = "UPLOADER_SERVER_URL", default_value = "http://127.0.0.1:5000")]
    server_url: String,
}

fn main() -> eframe::Result<()> {
    let args = Args::parse();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(64);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(2048);
    let feed = backend_bridge::runtime::launch(cmd_rx, ui_tx, args.server_url.clone());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Domain Checker")
            .with_inner_size([560.0, 520.0])
            .with_min_inner_size([420.0, 380.0]),
        ..Default::default()
    };
    let startup = StartupConfig {
        server_url: args.server_url,
    };
    eframe::run_native(
        "Domain Checker",
        options,
        Box::new(move |_cc| Ok(Box::new(UploaderApp::new(cmd_tx, ui_rx, feed, startup)))),
    )
}

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use shared::{
    domain::SelectedFile,
    protocol::{has_accepted_extension, ACCEPTED_EXTENSIONS},
};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use upload_client::{ControllerEvent, HttpUploadTransport, SubmitOutcome, UploadController};

mod config;

#[derive(Parser, Debug)]
#[command(about = "Upload a domain list and save the generated report")]
struct Args {
    /// Domain list to check (.txt, .docx or .xlsx).
    file: PathBuf,
    /// Report server root, e.g. http://127.0.0.1:5000
    #[arg(long)]
    server_url: Option<String>,
    /// Where to write the report. Defaults to <report_dir>/domain_report.xlsx.
    #[arg(long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut settings = config::load_settings()?;
    if let Some(server_url) = args.server_url.clone() {
        settings.server_url = server_url;
    }

    let filter = EnvFilter::try_new(&settings.log_filter).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let file = read_selected_file(&args.file).await?;
    if !has_accepted_extension(&file.name) {
        warn!(
            file = %file.name,
            "report server only accepts {} files",
            ACCEPTED_EXTENSIONS.join(", ")
        );
    }

    let transport = HttpUploadTransport::new(&settings.server_url)?;
    info!(endpoint = %transport.endpoint(), "using report server");
    let controller = UploadController::new(transport);
    let progress_log = tokio::spawn(log_progress(controller.subscribe_events()));

    controller.select_file(Some(file)).await;
    let outcome = controller.submit().await.map_err(|err| {
        let message = err.user_message();
        anyhow::Error::new(err).context(message)
    });
    progress_log.abort();

    let result = match outcome? {
        SubmitOutcome::Completed(result) => result,
        SubmitOutcome::Superseded => bail!("upload was superseded before it completed"),
    };

    println!("Report summary");
    for (label, value) in result.summary.display_rows() {
        println!("  {label:<14} {value}");
    }

    let output = args
        .output
        .unwrap_or_else(|| settings.report_dir.join(&result.artifact.filename));
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let written = controller
        .save_artifact(&result.artifact.url, &output)
        .await?;
    println!("Saved {written} bytes to {}", output.display());

    Ok(())
}

async fn read_selected_file(path: &Path) -> Result<SelectedFile> {
    let content = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(SelectedFile::new(name, content))
}

async fn log_progress(mut events: broadcast::Receiver<ControllerEvent>) {
    let mut last_stage: Option<String> = None;
    loop {
        match events.recv().await {
            Ok(ControllerEvent::View(view)) => {
                let Some(progress) = view.progress else {
                    continue;
                };
                if last_stage.as_deref() != Some(progress.stage_label.as_str()) {
                    info!(percent = progress.percent, "{}", progress.stage_label);
                    last_stage = Some(progress.stage_label);
                }
            }
            Ok(ControllerEvent::Notification(Some(notification))) => {
                debug!(kind = ?notification.kind, "{}", notification.message);
            }
            Ok(ControllerEvent::Notification(None)) => {}
            Err(RecvError::Lagged(skipped)) => debug!(skipped, "progress log lagged"),
            Err(RecvError::Closed) => break,
        }
    }
}

//! Backend commands queued from UI to backend worker.

use std::path::PathBuf;

pub enum BackendCommand {
    SelectFile { path: PathBuf },
    ClearFile,
    Submit,
    SaveReport { url: String, path: PathBuf },
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            BackendCommand::SelectFile { .. } => "select_file",
            BackendCommand::ClearFile => "clear_file",
            BackendCommand::Submit => "submit",
            BackendCommand::SaveReport { .. } => "save_report",
        }
    }
}

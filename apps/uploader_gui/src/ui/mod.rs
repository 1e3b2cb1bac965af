//! UI layer for the uploader window.

pub mod app;

pub use app::{StartupConfig, UploaderApp};

//! Wire contract of the report endpoint.

/// Path of the single upload endpoint, relative to the server root.
pub const UPLOAD_PATH: &str = "/upload";
/// Multipart form field carrying the file bytes.
pub const UPLOAD_FIELD: &str = "file";
/// Name offered for the downloaded report, whatever the server calls it.
pub const REPORT_FILENAME: &str = "domain_report.xlsx";

pub const TOTAL_DOMAINS_HEADER: &str = "x-total-domains";
pub const WORKING_DOMAINS_HEADER: &str = "x-working-domains";
pub const NOT_WORKING_DOMAINS_HEADER: &str = "x-not-working-domains";
pub const NEED_CHECK_DOMAINS_HEADER: &str = "x-need-check-domains";

/// Input formats the report server accepts.
pub const ACCEPTED_EXTENSIONS: &[&str] = &["txt", "docx", "xlsx"];

pub fn is_json_content_type(content_type: &str) -> bool {
    content_type
        .to_ascii_lowercase()
        .contains("application/json")
}

pub fn has_accepted_extension(filename: &str) -> bool {
    let Some((_, ext)) = filename.rsplit_once('.') else {
        return false;
    };
    let ext = ext.to_ascii_lowercase();
    ACCEPTED_EXTENSIONS.iter().any(|accepted| *accepted == ext)
}

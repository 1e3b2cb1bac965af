use serde::{Deserialize, Serialize};

use crate::protocol::{
    NEED_CHECK_DOMAINS_HEADER, NOT_WORKING_DOMAINS_HEADER, TOTAL_DOMAINS_HEADER,
    WORKING_DOMAINS_HEADER,
};

/// Shown in place of a count the server did not report.
pub const UNAVAILABLE: &str = "N/A";

#[derive(Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub content: Vec<u8>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    pub fn size_bytes(&self) -> u64 {
        self.content.len() as u64
    }
}

impl std::fmt::Debug for SelectedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectedFile")
            .field("name", &self.name)
            .field("size_bytes", &self.content.len())
            .finish()
    }
}

/// Domain check statistics reported alongside a generated report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total: Option<u64>,
    pub working: Option<u64>,
    pub not_working: Option<u64>,
    pub need_check: Option<u64>,
}

impl ReportSummary {
    /// Builds a summary from response metadata. `lookup` receives lower-case
    /// header names; absent or non-decimal values become unavailable.
    pub fn from_headers<'a>(lookup: impl Fn(&str) -> Option<&'a str>) -> Self {
        let count = |name: &str| lookup(name).and_then(parse_count);
        Self {
            total: count(TOTAL_DOMAINS_HEADER),
            working: count(WORKING_DOMAINS_HEADER),
            not_working: count(NOT_WORKING_DOMAINS_HEADER),
            need_check: count(NEED_CHECK_DOMAINS_HEADER),
        }
    }

    pub fn display_rows(&self) -> [(&'static str, String); 4] {
        [
            ("Total domains", display_count(self.total)),
            ("Working", display_count(self.working)),
            ("Not working", display_count(self.not_working)),
            ("Needs check", display_count(self.need_check)),
        ]
    }
}

pub fn display_count(value: Option<u64>) -> String {
    value
        .map(|count| count.to_string())
        .unwrap_or_else(|| UNAVAILABLE.to_string())
}

fn parse_count(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn reads_all_four_counts() {
        let headers: HashMap<&str, &str> = HashMap::from([
            ("x-total-domains", "100"),
            ("x-working-domains", "80"),
            ("x-not-working-domains", "15"),
            ("x-need-check-domains", "5"),
        ]);
        let summary = ReportSummary::from_headers(|name| headers.get(name).copied());
        assert_eq!(
            summary,
            ReportSummary {
                total: Some(100),
                working: Some(80),
                not_working: Some(15),
                need_check: Some(5),
            }
        );
    }

    #[test]
    fn missing_and_malformed_counts_display_as_unavailable() {
        let headers: HashMap<&str, &str> =
            HashMap::from([("x-total-domains", "-3"), ("x-working-domains", "12abc")]);
        let summary = ReportSummary::from_headers(|name| headers.get(name).copied());
        assert_eq!(summary, ReportSummary::default());
        for (_, value) in summary.display_rows() {
            assert_eq!(value, UNAVAILABLE);
        }
    }

    #[test]
    fn surrounding_whitespace_is_tolerated() {
        assert_eq!(parse_count(" 42 "), Some(42));
        assert_eq!(parse_count(""), None);
    }
}

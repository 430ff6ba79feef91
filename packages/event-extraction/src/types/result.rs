//! Per-sub-extraction audit results.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::record::EventRecord;

/// Which pipeline produced a [`WorkflowResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Text,
    Url,
    Image,
    Pdf,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SourceKind::Text => "text",
            SourceKind::Url => "url",
            SourceKind::Image => "image",
            SourceKind::Pdf => "pdf",
        };
        f.write_str(s)
    }
}

/// Outcome of one sub-extraction, kept for audit.
///
/// `extracted` is the fragment this invocation produced, before it was
/// merged into the shared record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowResult {
    #[serde(rename = "source_type")]
    pub source_kind: SourceKind,

    /// Truncated preview of the raw source
    pub source_content: String,

    #[serde(rename = "extracted_data")]
    pub extracted: EventRecord,

    /// URLs found in the source (top-level text and URL sources only)
    pub discovered_urls: Option<Vec<String>>,

    pub errors: Option<Vec<String>>,
}

impl WorkflowResult {
    pub fn new(
        source_kind: SourceKind,
        source_content: impl Into<String>,
        extracted: EventRecord,
    ) -> Self {
        Self {
            source_kind,
            source_content: source_content.into(),
            extracted,
            discovered_urls: None,
            errors: None,
        }
    }

    /// Result with nothing extracted.
    pub fn empty(source_kind: SourceKind, source_content: impl Into<String>) -> Self {
        Self::new(source_kind, source_content, EventRecord::default())
    }

    /// Result carrying one error and nothing extracted.
    pub fn failed(
        source_kind: SourceKind,
        source_content: impl Into<String>,
        error: impl fmt::Display,
    ) -> Self {
        Self::empty(source_kind, source_content).with_error(error)
    }

    pub fn with_error(mut self, error: impl fmt::Display) -> Self {
        self.errors
            .get_or_insert_with(Vec::new)
            .push(error.to_string());
        self
    }

    pub fn with_discovered_urls(mut self, urls: Vec<String>) -> Self {
        self.discovered_urls = Some(urls);
        self
    }

    pub fn with_source_kind(mut self, source_kind: SourceKind) -> Self {
        self.source_kind = source_kind;
        self
    }

    pub fn is_error(&self) -> bool {
        self.errors.as_ref().is_some_and(|e| !e.is_empty())
    }

    pub fn discovered(&self) -> &[String] {
        self.discovered_urls.as_deref().unwrap_or(&[])
    }
}

/// First `max_chars` characters of `text`, with `...` appended when cut.
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        assert_eq!(preview("short", 10), "short");
        assert_eq!(preview("abcdef", 3), "abc...");
        assert_eq!(preview("שלום עולם", 4), "שלום...");
    }

    #[test]
    fn test_failed_result() {
        let result = WorkflowResult::failed(SourceKind::Image, "Error processing image", "boom");
        assert!(result.is_error());
        assert_eq!(result.errors, Some(vec!["boom".to_string()]));
        assert!(result.extracted.is_empty());
        assert!(result.discovered().is_empty());
    }

    #[test]
    fn test_serializes_source_type_lowercase() {
        let result = WorkflowResult::empty(SourceKind::Pdf, "No text found in PDF");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["source_type"], "pdf");
        assert!(json["discovered_urls"].is_null());
    }
}

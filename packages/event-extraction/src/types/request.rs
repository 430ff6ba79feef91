//! Caller-facing request and response shapes.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use super::{record::EventRecord, result::WorkflowResult};
use crate::error::{SourceError, SourceResult};

/// An image handed to the image pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageInput {
    /// `data:image/...;base64,...` as sent by browsers
    DataUri(String),
    /// http(s) image URL, fetched over the network
    Url(String),
    /// Raw image payload
    Bytes(Vec<u8>),
}

impl ImageInput {
    /// Interpret a textual image reference.
    pub fn parse(input: &str) -> SourceResult<Self> {
        let input = input.trim();
        if input.starts_with("data:image") {
            Ok(Self::DataUri(input.to_string()))
        } else if input.starts_with("http://") || input.starts_with("https://") {
            Ok(Self::Url(input.to_string()))
        } else {
            Err(SourceError::InvalidInput("Invalid image input format".into()))
        }
    }

    /// The URL to credit as the record's image, if this input has one.
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Url(url) => Some(url),
            _ => None,
        }
    }

    /// Decode a data URI into its payload.
    pub fn decode_data_uri(uri: &str) -> SourceResult<Vec<u8>> {
        let (_, payload) = uri
            .split_once(',')
            .ok_or_else(|| SourceError::InvalidInput("data URI has no payload".into()))?;
        STANDARD
            .decode(payload.trim())
            .map_err(|e| SourceError::InvalidInput(format!("bad base64 image payload: {}", e)))
    }
}

/// One inbound request bundling any of text, image and PDF.
#[derive(Debug, Clone, Default)]
pub struct WorkflowRequest {
    pub text: Option<String>,
    pub image: Option<ImageInput>,
    pub pdf: Option<Vec<u8>>,
}

impl WorkflowRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_image(mut self, image: ImageInput) -> Self {
        self.image = Some(image);
        self
    }

    pub fn with_pdf(mut self, pdf: Vec<u8>) -> Self {
        self.pdf = Some(pdf);
        self
    }

    /// True when there is nothing to process. Blank text counts as absent.
    pub fn is_empty(&self) -> bool {
        self.text.as_deref().map_or(true, |t| t.trim().is_empty())
            && self.image.is_none()
            && self.pdf.is_none()
    }
}

/// Counts reported alongside the trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowSummary {
    /// Number of sub-extractions in the trace
    pub count: usize,
    /// Number of distinct URLs followed at depth 1
    pub discovered_url_count: usize,
}

/// Final merged record plus the audit trail that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowResponse {
    pub merged_record: EventRecord,
    pub trace: Vec<WorkflowResult>,
    pub summary: WorkflowSummary,
}

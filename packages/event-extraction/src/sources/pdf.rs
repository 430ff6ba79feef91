//! PDF text extraction with lopdf.

use async_trait::async_trait;
use lopdf::Document;
use tracing::{debug, warn};

use crate::error::{SourceError, SourceResult};
use crate::traits::source::PdfText;

/// Reads the text layer of every page. Scanned PDFs without a text layer
/// come back empty.
#[derive(Debug, Clone, Default)]
pub struct LopdfText;

impl LopdfText {
    pub fn new() -> Self {
        Self
    }
}

fn extract_all_pages(pdf: &[u8]) -> SourceResult<String> {
    let document = Document::load_mem(pdf).map_err(|e| SourceError::Pdf(e.to_string()))?;

    let mut pages = Vec::new();
    for page_number in document.get_pages().into_keys() {
        match document.extract_text(&[page_number]) {
            Ok(text) => pages.push(text),
            Err(e) => warn!(page = page_number, error = %e, "Skipping unreadable PDF page"),
        }
    }

    debug!(pages = pages.len(), "Extracted PDF text");
    Ok(pages.join("\n").trim().to_string())
}

#[async_trait]
impl PdfText for LopdfText {
    async fn extract_text(&self, pdf: &[u8]) -> SourceResult<String> {
        let bytes = pdf.to_vec();
        tokio::task::spawn_blocking(move || extract_all_pages(&bytes))
            .await
            .map_err(|e| SourceError::Pdf(format!("PDF worker failed: {}", e)))?
    }

    fn name(&self) -> &str {
        "lopdf"
    }
}

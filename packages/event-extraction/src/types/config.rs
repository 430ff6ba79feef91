//! Configuration for the extraction workflow.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Limits and budgets applied by the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Images processed from one scraped page.
    ///
    /// Default: 3.
    pub max_page_images: usize,

    /// Characters of source text submitted to the field backend.
    ///
    /// Default: 3000.
    pub max_backend_chars: usize,

    /// Characters of text kept in a result's `source_content`.
    ///
    /// Default: 500.
    pub text_preview_chars: usize,

    /// Characters of OCR text kept in a result's `source_content`.
    ///
    /// Default: 200.
    pub ocr_preview_chars: usize,

    /// Budget for each external call (scrape, fetch, OCR, PDF, backend).
    ///
    /// Default: 90 seconds.
    pub sub_extraction_timeout: Duration,

    /// How many hops of discovered links to follow. Only 0 and 1 are
    /// meaningful; anything above is treated as 1.
    ///
    /// Default: 1.
    pub max_discovery_depth: usize,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            max_page_images: 3,
            max_backend_chars: 3000,
            text_preview_chars: 500,
            ocr_preview_chars: 200,
            sub_extraction_timeout: Duration::from_secs(90),
            max_discovery_depth: 1,
        }
    }
}

impl WorkflowConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_page_images(mut self, max: usize) -> Self {
        self.max_page_images = max;
        self
    }

    pub fn with_max_backend_chars(mut self, max: usize) -> Self {
        self.max_backend_chars = max;
        self
    }

    pub fn with_sub_extraction_timeout(mut self, timeout: Duration) -> Self {
        self.sub_extraction_timeout = timeout;
        self
    }

    /// Disable (0) or enable (1) following discovered links.
    pub fn with_max_discovery_depth(mut self, depth: usize) -> Self {
        self.max_discovery_depth = depth;
        self
    }
}

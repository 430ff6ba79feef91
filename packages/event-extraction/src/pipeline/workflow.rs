//! Top-level request driver.

use tracing::{info, warn};

use super::links::{classify_url_only, discover_links};
use super::orchestrator::Orchestrator;
use crate::error::WorkflowError;
use crate::types::{
    record::EventRecord,
    request::{WorkflowRequest, WorkflowResponse, WorkflowSummary},
};

impl Orchestrator {
    /// Process every input of `request` into one merged record.
    ///
    /// Text, image and PDF run in that order at depth 0. Text that is a
    /// single URL goes through the URL pipeline instead of the text one.
    /// Links discovered at depth 0 are then followed once each at depth 1;
    /// a failing link is logged and kept in the trace, never fatal.
    pub async fn run(&self, request: WorkflowRequest) -> Result<WorkflowResponse, WorkflowError> {
        if request.is_empty() {
            return Err(WorkflowError::EmptyRequest);
        }

        let mut record = EventRecord::new();
        let mut trace = Vec::new();
        let mut processed = Vec::new();

        if let Some(text) = request.text.as_deref().filter(|t| !t.trim().is_empty()) {
            match classify_url_only(text) {
                Some(url) => {
                    trace.push(self.process_url(&url, &mut record, 0).await);
                    processed.push(url);
                }
                None => trace.push(self.process_text(text, &mut record, 0).await),
            }
        }

        if let Some(image) = request.image {
            trace.push(self.process_image(image, &mut record).await);
        }

        if let Some(pdf) = request.pdf.as_deref() {
            trace.push(self.process_pdf(pdf, &mut record).await);
        }

        let discovered = if self.config.max_discovery_depth > 0 {
            discover_links(&trace, &processed)
        } else {
            Vec::new()
        };
        info!(
            initial = trace.len(),
            discovered = discovered.len(),
            "Following discovered links"
        );

        for url in &discovered {
            let result = self.process_url(url, &mut record, 1).await;
            if result.is_error() {
                warn!(url = %url, errors = ?result.errors, "Discovered link failed");
            }
            trace.push(result);
        }

        Ok(WorkflowResponse {
            merged_record: record,
            summary: WorkflowSummary {
                count: trace.len(),
                discovered_url_count: discovered.len(),
            },
            trace,
        })
    }
}

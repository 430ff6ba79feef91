//! Per-source extraction pipelines.
//!
//! Every entry point returns exactly one [`WorkflowResult`] and never an
//! error: extractor and backend failures are recorded on the result. The
//! shared record is only touched after a fragment was extracted
//! successfully, so a failed step leaves it as it was.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::links::{extract_image_urls, extract_links};
use super::merge::merge;
use crate::error::{FieldExtractionError, FieldResult, SourceError, SourceResult};
use crate::traits::{
    fields::FieldExtractor,
    source::{BinaryFetcher, ImageOcr, PdfText, UrlSource},
};
use crate::types::{
    config::WorkflowConfig,
    record::{EventField, EventRecord},
    request::ImageInput,
    result::{preview, SourceKind, WorkflowResult},
    schema::FieldSchema,
};

/// The capabilities a workflow runs against.
#[derive(Clone)]
pub struct Extractors {
    pub url: Arc<dyn UrlSource>,
    pub image: Arc<dyn ImageOcr>,
    pub pdf: Arc<dyn PdfText>,
    pub fetcher: Arc<dyn BinaryFetcher>,
    pub fields: Arc<dyn FieldExtractor>,
}

/// Drives sources through the field backend into one shared record.
#[derive(Clone)]
pub struct Orchestrator {
    pub(crate) extractors: Extractors,
    schema: Arc<FieldSchema>,
    pub(crate) config: WorkflowConfig,
}

impl Orchestrator {
    pub fn new(extractors: Extractors, schema: Arc<FieldSchema>) -> Self {
        Self {
            extractors,
            schema,
            config: WorkflowConfig::default(),
        }
    }

    pub fn with_config(mut self, config: WorkflowConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    pub fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    /// Run one external call under the sub-extraction budget.
    async fn within<T, E>(
        &self,
        call: impl Future<Output = Result<T, E>>,
        on_timeout: fn(Duration) -> E,
    ) -> Result<T, E> {
        let budget = self.config.sub_extraction_timeout;
        tokio::time::timeout(budget, call)
            .await
            .unwrap_or_else(|_| Err(on_timeout(budget)))
    }

    /// Ask the field backend about `text` and convert its answer.
    async fn extract_record(&self, text: &str) -> FieldResult<EventRecord> {
        let submitted = truncate_chars(text, self.config.max_backend_chars);
        debug!(
            backend = self.extractors.fields.name(),
            chars = submitted.chars().count(),
            "Requesting field extraction"
        );

        let map = self
            .within(
                self.extractors.fields.extract_fields(submitted, &self.schema),
                FieldExtractionError::Timeout,
            )
            .await?;

        Ok(EventRecord::from_field_map(&map))
    }

    /// Extract fields from free text and merge them into `record`.
    ///
    /// At depth 0 the links found in `text` are returned as
    /// `discovered_urls`; deeper calls skip discovery.
    pub async fn process_text(
        &self,
        text: &str,
        record: &mut EventRecord,
        depth: usize,
    ) -> WorkflowResult {
        let source_content = preview(text, self.config.text_preview_chars);

        match self.extract_record(text).await {
            Ok(extracted) => {
                let conflicts = merge(record, &extracted);
                if !conflicts.is_empty() {
                    debug!(conflicts = conflicts.len(), depth, "Merge recorded conflicts");
                }

                let result = WorkflowResult::new(SourceKind::Text, source_content, extracted);
                if depth == 0 {
                    let links = extract_links(text);
                    debug!(links = links.len(), "Discovered links in text");
                    result.with_discovered_urls(links)
                } else {
                    result
                }
            }
            Err(e) => {
                warn!(error = %e, depth, "Text extraction failed");
                WorkflowResult::failed(SourceKind::Text, source_content, e)
            }
        }
    }

    /// Scrape `url`, extract fields from its text and, at depth 0, run up to
    /// `max_page_images` of its embedded images through the image pipeline.
    pub async fn process_url(
        &self,
        url: &str,
        record: &mut EventRecord,
        depth: usize,
    ) -> WorkflowResult {
        info!(url = %url, depth, source = self.extractors.url.name(), "Processing URL");

        let page = match self
            .within(self.extractors.url.fetch_page(url), SourceError::Timeout)
            .await
        {
            Ok(page) => page,
            Err(e) => {
                warn!(url = %url, error = %e, "Failed to fetch page");
                return WorkflowResult::failed(SourceKind::Url, url, e);
            }
        };

        let text_result = self.process_text(&page.text, record, depth).await;

        if depth == 0 {
            let images = extract_image_urls(page.markup(), url);
            debug!(url = %url, found = images.len(), "Found embedded images");

            for image_src in images.into_iter().take(self.config.max_page_images) {
                let input = match ImageInput::parse(&image_src) {
                    Ok(input) => input,
                    Err(_) => {
                        debug!(image_src = %image_src, "Skipping unsupported image source");
                        continue;
                    }
                };
                let image_result = self.process_image(input, record).await;
                if image_result.is_error() {
                    warn!(image_src = %image_src, errors = ?image_result.errors, "Embedded image failed");
                }
            }
        }

        WorkflowResult {
            source_kind: SourceKind::Url,
            source_content: url.to_string(),
            extracted: text_result.extracted,
            discovered_urls: if depth == 0 {
                text_result.discovered_urls
            } else {
                None
            },
            errors: text_result.errors,
        }
    }

    async fn load_image(&self, input: ImageInput) -> SourceResult<Vec<u8>> {
        match input {
            ImageInput::DataUri(uri) => ImageInput::decode_data_uri(&uri),
            ImageInput::Url(url) => {
                self.within(self.extractors.fetcher.fetch_bytes(&url), SourceError::Timeout)
                    .await
            }
            ImageInput::Bytes(bytes) => Ok(bytes),
        }
    }

    /// OCR an image, extract fields from the recognized text and merge them.
    ///
    /// An http(s) image whose fragment carries a date, event name or start
    /// time claims the record's image slot unless it is already taken.
    pub async fn process_image(&self, input: ImageInput, record: &mut EventRecord) -> WorkflowResult {
        let image_url = input.url().map(str::to_string);

        let bytes = match self.load_image(input).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(image_url = ?image_url, error = %e, "Failed to load image");
                return WorkflowResult::failed(SourceKind::Image, "Error processing image", e);
            }
        };

        let ocr_text = match self
            .within(self.extractors.image.extract_text(&bytes), SourceError::Timeout)
            .await
        {
            Ok(text) => text,
            Err(e) => {
                warn!(image_url = ?image_url, error = %e, "OCR failed");
                return WorkflowResult::failed(SourceKind::Image, "Error processing image", e);
            }
        };

        if ocr_text.trim().is_empty() {
            debug!(image_url = ?image_url, "No text recognized in image");
            return WorkflowResult::empty(SourceKind::Image, "No text found in image");
        }

        let extracted = match self.extract_record(&ocr_text).await {
            Ok(extracted) => extracted,
            Err(e) => {
                warn!(image_url = ?image_url, error = %e, "Image field extraction failed");
                return WorkflowResult::failed(SourceKind::Image, "Error processing image", e);
            }
        };

        merge(record, &extracted);

        if let Some(url) = image_url {
            if extracted.has_headline() && record.present(EventField::Image).is_none() {
                debug!(image_url = %url, "Image claims the record's image slot");
                record.image = Some(url);
            }
        }

        WorkflowResult::new(
            SourceKind::Image,
            format!("OCR Text: {}", preview(&ocr_text, self.config.ocr_preview_chars)),
            extracted,
        )
    }

    /// Extract the text of every page and run it through the text pipeline
    /// at depth 0.
    pub async fn process_pdf(&self, pdf: &[u8], record: &mut EventRecord) -> WorkflowResult {
        let text = match self
            .within(self.extractors.pdf.extract_text(pdf), SourceError::Timeout)
            .await
        {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, bytes = pdf.len(), "PDF extraction failed");
                return WorkflowResult::failed(SourceKind::Pdf, "Error processing PDF", e);
            }
        };

        if text.trim().is_empty() {
            return WorkflowResult::empty(SourceKind::Pdf, "No text found in PDF");
        }

        self.process_text(&text, record, 0)
            .await
            .with_source_kind(SourceKind::Pdf)
    }
}

/// First `max_chars` characters of `text`.
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        MockFetcher, MockFieldExtractor, MockImageOcr, MockPdfText, MockUrlSource,
    };
    use crate::traits::source::ScrapedPage;
    use serde_json::json;

    struct Harness {
        urls: MockUrlSource,
        ocr: MockImageOcr,
        pdf: MockPdfText,
        fetcher: MockFetcher,
        fields: MockFieldExtractor,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                urls: MockUrlSource::new(),
                ocr: MockImageOcr::new(),
                pdf: MockPdfText::new(),
                fetcher: MockFetcher::new(),
                fields: MockFieldExtractor::new(),
            }
        }

        fn orchestrator(&self) -> Orchestrator {
            Orchestrator::new(
                Extractors {
                    url: Arc::new(self.urls.clone()),
                    image: Arc::new(self.ocr.clone()),
                    pdf: Arc::new(self.pdf.clone()),
                    fetcher: Arc::new(self.fetcher.clone()),
                    fields: Arc::new(self.fields.clone()),
                },
                Arc::new(FieldSchema::builtin()),
            )
        }
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("abcdef", 3), "abc");
        assert_eq!(truncate_chars("אבג", 5), "אבג");
    }

    #[tokio::test]
    async fn test_process_text_depth_zero_discovers_links() {
        let harness = Harness {
            fields: MockFieldExtractor::new().with_response("Meetup", json!({"שם_האירוע": "Meetup"})),
            ..Harness::new()
        };
        let mut record = EventRecord::new();

        let result = harness
            .orchestrator()
            .process_text("Meetup https://A.example/x#top", &mut record, 0)
            .await;

        assert!(!result.is_error());
        assert_eq!(
            result.discovered_urls,
            Some(vec!["https://a.example/x".to_string()])
        );
        assert_eq!(record.event_name.as_deref(), Some("Meetup"));
    }

    #[tokio::test]
    async fn test_process_text_depth_one_skips_discovery() {
        let harness = Harness::new();
        let mut record = EventRecord::new();

        let result = harness
            .orchestrator()
            .process_text("see https://a.example/x", &mut record, 1)
            .await;

        assert_eq!(result.discovered_urls, None);
    }

    #[tokio::test]
    async fn test_process_text_truncates_backend_input() {
        let harness = Harness::new();
        let orchestrator = harness
            .orchestrator()
            .with_config(WorkflowConfig::default().with_max_backend_chars(10));
        let mut record = EventRecord::new();

        orchestrator
            .process_text(&"x".repeat(50), &mut record, 0)
            .await;

        assert_eq!(harness.fields.calls(), vec!["x".repeat(10)]);
    }

    #[tokio::test]
    async fn test_process_text_backend_failure_is_recorded() {
        let harness = Harness {
            fields: MockFieldExtractor::new().with_failure("not json"),
            ..Harness::new()
        };
        let mut record = EventRecord::new();

        let result = harness
            .orchestrator()
            .process_text("anything https://a.example", &mut record, 0)
            .await;

        assert!(result.is_error());
        assert_eq!(result.discovered_urls, None);
        assert!(record.is_empty());
    }

    #[tokio::test]
    async fn test_process_url_fetch_failure() {
        let harness = Harness::new();
        let mut record = EventRecord::new();

        let result = harness
            .orchestrator()
            .process_url("https://missing.example", &mut record, 0)
            .await;

        assert_eq!(result.source_kind, SourceKind::Url);
        assert_eq!(result.source_content, "https://missing.example");
        assert!(result.is_error());
        assert!(harness.fields.calls().is_empty());
    }

    #[tokio::test]
    async fn test_process_url_depth_one_reports_no_links_or_images() {
        let harness = Harness {
            urls: MockUrlSource::new().with_page(
                ScrapedPage::new("https://a.example", "see https://b.example")
                    .with_html(r#"<img src="/poster.png">"#),
            ),
            ..Harness::new()
        };
        let mut record = EventRecord::new();

        let result = harness
            .orchestrator()
            .process_url("https://a.example", &mut record, 1)
            .await;

        assert!(!result.is_error());
        assert_eq!(result.discovered_urls, None);
        assert_eq!(harness.ocr.call_count(), 0);
    }

    #[tokio::test]
    async fn test_process_url_decodes_inline_page_images() {
        let harness = Harness {
            urls: MockUrlSource::new().with_page(
                ScrapedPage::new("https://a.example", "Summit page").with_html(
                    r#"<img src="data:image/png;base64,aGVsbG8="><img src="ftp://a.example/x.png">"#,
                ),
            ),
            ocr: MockImageOcr::new().with_text(b"hello", "Summit 05.06.25"),
            ..Harness::new()
        };
        let mut record = EventRecord::new();

        let result = harness
            .orchestrator()
            .process_url("https://a.example", &mut record, 0)
            .await;

        assert!(!result.is_error());
        assert_eq!(harness.ocr.calls(), vec![b"hello".to_vec()]);
        assert!(harness.fetcher.calls().is_empty());
        assert_eq!(record.image, None);
    }

    #[tokio::test]
    async fn test_process_image_empty_ocr_leaves_record() {
        let harness = Harness::new();
        let mut record = EventRecord::new();

        let result = harness
            .orchestrator()
            .process_image(ImageInput::Bytes(b"blank".to_vec()), &mut record)
            .await;

        assert!(!result.is_error());
        assert_eq!(result.source_content, "No text found in image");
        assert!(record.is_empty());
        assert!(harness.fields.calls().is_empty());
    }

    #[tokio::test]
    async fn test_process_image_claims_slot_once() {
        let harness = Harness {
            ocr: MockImageOcr::new()
                .with_text("https://a.example/1.png", "Summit 05.06.25")
                .with_text("https://a.example/2.png", "Summit 05.06.25"),
            fields: MockFieldExtractor::new().with_response("Summit", json!({"תאריך": "05.06.25"})),
            ..Harness::new()
        };
        let orchestrator = harness.orchestrator();
        let mut record = EventRecord::new();

        let first = orchestrator
            .process_image(ImageInput::Url("https://a.example/1.png".into()), &mut record)
            .await;
        orchestrator
            .process_image(ImageInput::Url("https://a.example/2.png".into()), &mut record)
            .await;

        assert_eq!(first.source_content, "OCR Text: Summit 05.06.25");
        assert_eq!(record.image.as_deref(), Some("https://a.example/1.png"));
        assert_eq!(record.date.as_deref(), Some("05.06.25"));
        assert_eq!(record.error, None);
    }

    #[tokio::test]
    async fn test_process_image_without_headline_keeps_slot_empty() {
        let harness = Harness {
            ocr: MockImageOcr::new().with_text("https://a.example/logo.png", "Acme"),
            fields: MockFieldExtractor::new().with_response("Acme", json!({"חברה_מארחת": "Acme"})),
            ..Harness::new()
        };
        let mut record = EventRecord::new();

        harness
            .orchestrator()
            .process_image(ImageInput::Url("https://a.example/logo.png".into()), &mut record)
            .await;

        assert_eq!(record.host_organization.as_deref(), Some("Acme"));
        assert_eq!(record.image, None);
    }

    #[tokio::test]
    async fn test_process_image_bad_data_uri() {
        let harness = Harness::new();
        let mut record = EventRecord::new();

        let result = harness
            .orchestrator()
            .process_image(ImageInput::DataUri("data:image/png;base64".into()), &mut record)
            .await;

        assert!(result.is_error());
        assert_eq!(result.source_content, "Error processing image");
        assert_eq!(harness.ocr.call_count(), 0);
    }

    #[tokio::test]
    async fn test_process_pdf_relabels_text_result() {
        let harness = Harness {
            pdf: MockPdfText::new().with_text("Workshop on 01.07.25 https://w.example"),
            fields: MockFieldExtractor::new().with_response("Workshop", json!({"תאריך": "01.07.25"})),
            ..Harness::new()
        };
        let mut record = EventRecord::new();

        let result = harness
            .orchestrator()
            .process_pdf(b"%PDF-1.4", &mut record)
            .await;

        assert_eq!(result.source_kind, SourceKind::Pdf);
        assert_eq!(result.discovered(), ["https://w.example".to_string()]);
        assert_eq!(record.date.as_deref(), Some("01.07.25"));
    }

    #[tokio::test]
    async fn test_process_pdf_empty_text() {
        let harness = Harness {
            pdf: MockPdfText::new().with_text("   \n "),
            ..Harness::new()
        };
        let mut record = EventRecord::new();

        let result = harness
            .orchestrator()
            .process_pdf(b"%PDF-1.4", &mut record)
            .await;

        assert_eq!(result.source_kind, SourceKind::Pdf);
        assert_eq!(result.source_content, "No text found in PDF");
        assert!(!result.is_error());
    }

    #[tokio::test]
    async fn test_slow_capability_times_out() {
        let harness = Harness {
            pdf: MockPdfText::new()
                .with_text("late")
                .with_delay(Duration::from_millis(200)),
            ..Harness::new()
        };
        let orchestrator = harness.orchestrator().with_config(
            WorkflowConfig::default().with_sub_extraction_timeout(Duration::from_millis(20)),
        );
        let mut record = EventRecord::new();

        let result = orchestrator.process_pdf(b"%PDF", &mut record).await;

        assert!(result.is_error());
        assert_eq!(result.source_content, "Error processing PDF");
        assert!(result.errors.unwrap()[0].contains("timed out"));
    }
}

//! Testing utilities including mock implementations.
//!
//! These are useful for testing applications that use the extraction library
//! without making real scraping, OCR or language-model calls. Every mock is
//! `Clone` and clones share state, so a test can keep a handle for
//! assertions after handing a copy to the orchestrator.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::error::{FieldExtractionError, FieldResult, SourceError, SourceResult};
use crate::traits::{
    fields::FieldExtractor,
    source::{BinaryFetcher, ImageOcr, PdfText, ScrapedPage, UrlSource},
};
use crate::types::schema::FieldSchema;

/// A mock URL source serving predefined pages.
///
/// Unknown URLs fail with a 404.
#[derive(Default, Clone)]
pub struct MockUrlSource {
    pages: Arc<RwLock<HashMap<String, ScrapedPage>>>,
    calls: Arc<RwLock<Vec<String>>>,
}

impl MockUrlSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `page` for its URL.
    pub fn with_page(self, page: ScrapedPage) -> Self {
        self.pages.write().unwrap().insert(page.url.clone(), page);
        self
    }

    /// URLs fetched so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }

    pub fn fetch_call_count(&self) -> usize {
        self.calls.read().unwrap().len()
    }
}

#[async_trait]
impl UrlSource for MockUrlSource {
    async fn fetch_page(&self, url: &str) -> SourceResult<ScrapedPage> {
        self.calls.write().unwrap().push(url.to_string());

        self.pages
            .read()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| SourceError::HttpStatus {
                status: 404,
                url: url.to_string(),
            })
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// A mock OCR engine keyed by image bytes.
///
/// Unknown images yield no text.
#[derive(Default, Clone)]
pub struct MockImageOcr {
    texts: Arc<RwLock<HashMap<Vec<u8>, String>>>,
    failing: Arc<RwLock<HashSet<Vec<u8>>>>,
    calls: Arc<RwLock<Vec<Vec<u8>>>>,
}

impl MockImageOcr {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recognize `text` in the image whose bytes equal `image`.
    pub fn with_text(self, image: impl AsRef<[u8]>, text: impl Into<String>) -> Self {
        self.texts
            .write()
            .unwrap()
            .insert(image.as_ref().to_vec(), text.into());
        self
    }

    /// Fail recognition for the image whose bytes equal `image`.
    pub fn with_failure(self, image: impl AsRef<[u8]>) -> Self {
        self.failing.write().unwrap().insert(image.as_ref().to_vec());
        self
    }

    pub fn calls(&self) -> Vec<Vec<u8>> {
        self.calls.read().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.read().unwrap().len()
    }
}

#[async_trait]
impl ImageOcr for MockImageOcr {
    async fn extract_text(&self, image: &[u8]) -> SourceResult<String> {
        self.calls.write().unwrap().push(image.to_vec());

        if self.failing.read().unwrap().contains(image) {
            return Err(SourceError::Ocr("mock OCR failure".into()));
        }
        Ok(self
            .texts
            .read()
            .unwrap()
            .get(image)
            .cloned()
            .unwrap_or_default())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// A mock PDF reader returning the same text for every document.
#[derive(Default, Clone)]
pub struct MockPdfText {
    text: Arc<RwLock<String>>,
    failure: Arc<RwLock<Option<String>>>,
    delay: Arc<RwLock<Option<Duration>>>,
    calls: Arc<RwLock<usize>>,
}

impl MockPdfText {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(self, text: impl Into<String>) -> Self {
        *self.text.write().unwrap() = text.into();
        self
    }

    pub fn with_failure(self, message: impl Into<String>) -> Self {
        *self.failure.write().unwrap() = Some(message.into());
        self
    }

    /// Sleep before answering, for timeout tests.
    pub fn with_delay(self, delay: Duration) -> Self {
        *self.delay.write().unwrap() = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        *self.calls.read().unwrap()
    }
}

#[async_trait]
impl PdfText for MockPdfText {
    async fn extract_text(&self, _pdf: &[u8]) -> SourceResult<String> {
        *self.calls.write().unwrap() += 1;

        let delay = *self.delay.read().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = self.failure.read().unwrap().clone() {
            return Err(SourceError::Pdf(message));
        }
        Ok(self.text.read().unwrap().clone())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// A mock byte fetcher that answers with the URL's own bytes.
///
/// Pairs with [`MockImageOcr::with_text`] keyed by the image URL.
#[derive(Default, Clone)]
pub struct MockFetcher {
    failing: Arc<RwLock<HashSet<String>>>,
    calls: Arc<RwLock<Vec<String>>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail downloads of `url` with a 404.
    pub fn with_failure(self, url: impl Into<String>) -> Self {
        self.failing.write().unwrap().insert(url.into());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }
}

#[async_trait]
impl BinaryFetcher for MockFetcher {
    async fn fetch_bytes(&self, url: &str) -> SourceResult<Vec<u8>> {
        self.calls.write().unwrap().push(url.to_string());

        if self.failing.read().unwrap().contains(url) {
            return Err(SourceError::HttpStatus {
                status: 404,
                url: url.to_string(),
            });
        }
        Ok(url.as_bytes().to_vec())
    }
}

/// A mock field backend.
///
/// Answers with the first configured response whose needle occurs in the
/// submitted text, or an empty object when none does.
#[derive(Default, Clone)]
pub struct MockFieldExtractor {
    responses: Arc<RwLock<Vec<(String, Map<String, Value>)>>>,
    failure: Arc<RwLock<Option<String>>>,
    calls: Arc<RwLock<Vec<String>>>,
}

impl MockFieldExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `fields` for any text containing `needle`.
    ///
    /// `fields` must be a JSON object; anything else is ignored.
    pub fn with_response(self, needle: impl Into<String>, fields: Value) -> Self {
        if let Value::Object(map) = fields {
            self.responses.write().unwrap().push((needle.into(), map));
        }
        self
    }

    /// Fail every call as a malformed backend answer.
    pub fn with_failure(self, message: impl Into<String>) -> Self {
        *self.failure.write().unwrap() = Some(message.into());
        self
    }

    /// Texts submitted so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.write().unwrap().clear();
    }
}

#[async_trait]
impl FieldExtractor for MockFieldExtractor {
    async fn extract_fields(
        &self,
        text: &str,
        _schema: &FieldSchema,
    ) -> FieldResult<Map<String, Value>> {
        self.calls.write().unwrap().push(text.to_string());

        if let Some(message) = self.failure.read().unwrap().clone() {
            return Err(FieldExtractionError::Malformed(message));
        }

        Ok(self
            .responses
            .read()
            .unwrap()
            .iter()
            .find(|(needle, _)| text.contains(needle.as_str()))
            .map(|(_, fields)| fields.clone())
            .unwrap_or_default())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_mock_url_source_tracks_calls() {
        let source = MockUrlSource::new().with_page(ScrapedPage::new("https://a.example", "hi"));

        let page = source.fetch_page("https://a.example").await.unwrap();
        let missing = source.fetch_page("https://b.example").await;

        assert_eq!(page.text, "hi");
        assert!(matches!(missing, Err(SourceError::HttpStatus { status: 404, .. })));
        assert_eq!(source.fetch_call_count(), 2);
    }

    #[tokio::test]
    async fn test_mock_field_extractor_matches_needle() {
        let backend = MockFieldExtractor::new()
            .with_response("Summit", json!({"תאריך": "05.06.25"}))
            .with_response("ignored", json!("not an object"));
        let schema = FieldSchema::builtin();

        let hit = backend.extract_fields("AI Summit", &schema).await.unwrap();
        let miss = backend.extract_fields("other", &schema).await.unwrap();

        assert_eq!(hit.get("תאריך"), Some(&json!("05.06.25")));
        assert!(miss.is_empty());
        assert_eq!(backend.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let ocr = MockImageOcr::new().with_text(b"img", "text");
        let handle = ocr.clone();

        assert_eq!(ocr.extract_text(b"img").await.unwrap(), "text");
        assert_eq!(ocr.extract_text(b"other").await.unwrap(), "");
        assert_eq!(handle.call_count(), 2);
    }
}

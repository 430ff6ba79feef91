//! Source extractor traits.
//!
//! Each source kind sits behind its own narrow trait so the orchestrator never
//! cares whether a page came from a headless-browser service or a plain HTTP
//! GET, or which OCR engine read an image.
//!
//! # SSRF Protection
//!
//! Discovered links and image URLs come from untrusted input. Wrap URL-based
//! capabilities with [`ValidatedUrlSource`] / [`ValidatedFetcher`] in
//! production:
//!
//! ```rust,ignore
//! let source = ValidatedUrlSource::new(HttpUrlSource::new()?);
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{SourceError, SourceResult};
use crate::security::UrlValidator;

/// Text recovered from a URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapedPage {
    /// URL that was requested
    pub url: String,

    /// Readable text handed to the field backend
    pub text: String,

    /// Raw HTML when the source kept it; scanned for embedded images
    pub html: Option<String>,

    pub title: Option<String>,
}

impl ScrapedPage {
    pub fn new(url: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            text: text.into(),
            html: None,
            title: None,
        }
    }

    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.html = Some(html.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Content to scan for `<img>` references: HTML when kept, text otherwise.
    pub fn markup(&self) -> &str {
        self.html.as_deref().unwrap_or(&self.text)
    }

    pub fn has_content(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

/// URL to text.
#[async_trait]
pub trait UrlSource: Send + Sync {
    async fn fetch_page(&self, url: &str) -> SourceResult<ScrapedPage>;

    /// Name for logging.
    fn name(&self) -> &str {
        "unknown"
    }
}

/// Image bytes to text (optical recognition).
#[async_trait]
pub trait ImageOcr: Send + Sync {
    async fn extract_text(&self, image: &[u8]) -> SourceResult<String>;

    fn name(&self) -> &str {
        "unknown"
    }
}

/// PDF bytes to text, all pages concatenated.
#[async_trait]
pub trait PdfText: Send + Sync {
    async fn extract_text(&self, pdf: &[u8]) -> SourceResult<String>;

    fn name(&self) -> &str {
        "unknown"
    }
}

/// Downloads binary payloads (image URLs).
#[async_trait]
pub trait BinaryFetcher: Send + Sync {
    async fn fetch_bytes(&self, url: &str) -> SourceResult<Vec<u8>>;
}

/// A URL source that validates URLs before fetching (SSRF protection).
pub struct ValidatedUrlSource<S: UrlSource> {
    inner: S,
    validator: UrlValidator,
}

impl<S: UrlSource> ValidatedUrlSource<S> {
    /// Create a new validated source with default security rules.
    pub fn new(source: S) -> Self {
        Self {
            inner: source,
            validator: UrlValidator::new(),
        }
    }

    /// Create with a custom validator.
    pub fn with_validator(source: S, validator: UrlValidator) -> Self {
        Self {
            inner: source,
            validator,
        }
    }
}

#[async_trait]
impl<S: UrlSource> UrlSource for ValidatedUrlSource<S> {
    async fn fetch_page(&self, url: &str) -> SourceResult<ScrapedPage> {
        self.validator
            .validate_with_dns(url)
            .await
            .map_err(SourceError::Security)?;

        self.inner.fetch_page(url).await
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

/// A byte fetcher that validates URLs before downloading (SSRF protection).
pub struct ValidatedFetcher<F: BinaryFetcher> {
    inner: F,
    validator: UrlValidator,
}

impl<F: BinaryFetcher> ValidatedFetcher<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            inner: fetcher,
            validator: UrlValidator::new(),
        }
    }

    pub fn with_validator(fetcher: F, validator: UrlValidator) -> Self {
        Self {
            inner: fetcher,
            validator,
        }
    }
}

#[async_trait]
impl<F: BinaryFetcher> BinaryFetcher for ValidatedFetcher<F> {
    async fn fetch_bytes(&self, url: &str) -> SourceResult<Vec<u8>> {
        self.validator
            .validate_with_dns(url)
            .await
            .map_err(SourceError::Security)?;

        self.inner.fetch_bytes(url).await
    }
}

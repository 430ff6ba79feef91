//! Typed errors for the extraction library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling.
//!
//! Source and backend errors never escape a pipeline entry point: the
//! orchestrator turns them into error strings on a `WorkflowResult`.
//! Only [`WorkflowError`] reaches the caller.

use std::time::Duration;

use thiserror::Error;

/// Errors raised by a source extractor (URL, image, PDF, byte fetch).
#[derive(Debug, Error)]
pub enum SourceError {
    /// Transport-level HTTP failure
    #[error("HTTP error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Non-success HTTP status
    #[error("HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String },

    /// Input could not be interpreted (bad data URI, unknown image format)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Remote scraping service failed
    #[error("scraper error: {0}")]
    Scraper(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Optical text recognition failed
    #[error("OCR failed: {0}")]
    Ocr(String),

    /// PDF could not be parsed
    #[error("PDF extraction failed: {0}")]
    Pdf(String),

    /// Capability did not answer within the sub-extraction budget
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// URL rejected by SSRF validation
    #[error("security error: {0}")]
    Security(#[from] SecurityError),
}

/// Errors raised by the field-extraction backend.
#[derive(Debug, Error)]
pub enum FieldExtractionError {
    /// Backend unreachable or returned an error
    #[error("field backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Backend answered with something that is not a JSON object
    #[error("malformed backend response: {0}")]
    Malformed(String),

    /// Backend did not answer within the sub-extraction budget
    #[error("field backend timed out after {0:?}")]
    Timeout(Duration),
}

impl From<serde_json::Error> for FieldExtractionError {
    fn from(e: serde_json::Error) -> Self {
        Self::Malformed(e.to_string())
    }
}

/// Errors raised by a row store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying store failed
    #[error("store error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Sheet does not exist
    #[error("unknown sheet: {0}")]
    UnknownSheet(String),

    /// Row number outside the sheet
    #[error("row {row} out of range in sheet {sheet}")]
    RowOutOfRange { sheet: String, row: usize },
}

/// Caller-level failures with no sensible partial result.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Request carried none of text, image or PDF
    #[error("request contains no text, image or PDF input")]
    EmptyRequest,

    /// Request payload could not be decoded
    #[error("invalid request payload: {0}")]
    InvalidPayload(String),
}

/// Security-related errors, primarily for SSRF protection.
#[derive(Debug, Error)]
pub enum SecurityError {
    /// URL scheme not allowed (e.g., file://, ftp://)
    #[error("disallowed URL scheme: {0}")]
    DisallowedScheme(String),

    /// Host is blocked (e.g., localhost, internal IPs)
    #[error("blocked host: {0}")]
    BlockedHost(String),

    /// IP in blocked CIDR range (e.g., 10.0.0.0/8)
    #[error("blocked IP range: {0}")]
    BlockedCidr(String),

    /// URL has no host
    #[error("URL has no host")]
    NoHost,

    /// DNS resolution failed
    #[error("DNS resolution failed: {0}")]
    DnsResolution(String),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}

/// Result type alias for source extractors.
pub type SourceResult<T> = std::result::Result<T, SourceError>;

/// Result type alias for the field backend.
pub type FieldResult<T> = std::result::Result<T, FieldExtractionError>;

/// Result type alias for row stores.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Result type alias for security operations.
pub type SecurityResult<T> = std::result::Result<T, SecurityError>;

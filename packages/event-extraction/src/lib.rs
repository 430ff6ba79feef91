//! Multi-Source Event Extraction
//!
//! Turns event announcements (free text, URLs, scanned images, PDFs) into a
//! single structured [`EventRecord`] ready for the events ledger.
//!
//! # How a request flows
//!
//! - Each present input is routed to its pipeline (`process_text`,
//!   `process_url`, `process_image`, `process_pdf`).
//! - Every pipeline turns its source into text, asks the field backend for a
//!   best-effort field map, and merges that map into one shared record.
//! - Links found in directly supplied text are followed one hop deeper.
//! - Every sub-extraction leaves a [`WorkflowResult`] in the trace, including
//!   the ones that failed.
//!
//! Merging is first-writer-wins: a later source that disagrees with an
//! already-set field is recorded as a conflict note on the record instead of
//! overwriting it.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use event_extraction::{Extractors, FieldSchema, Orchestrator, WorkflowRequest};
//! use event_extraction::testing::{MockFieldExtractor, MockFetcher, MockImageOcr, MockPdfText, MockUrlSource};
//!
//! let extractors = Extractors {
//!     url: Arc::new(MockUrlSource::new()),
//!     image: Arc::new(MockImageOcr::new()),
//!     pdf: Arc::new(MockPdfText::new()),
//!     fetcher: Arc::new(MockFetcher::new()),
//!     fields: Arc::new(MockFieldExtractor::new()),
//! };
//! let orchestrator = Orchestrator::new(extractors, Arc::new(FieldSchema::builtin()));
//!
//! let response = orchestrator
//!     .run(WorkflowRequest::new().with_text("Meetup on 05.06.25 https://events.example/x"))
//!     .await?;
//! println!("{:?}", response.merged_record.date);
//! ```
//!
//! # Modules
//!
//! - [`types`] - Record, result, schema and request types
//! - [`pipeline`] - URL classification, link discovery, merge, orchestration
//! - [`traits`] - Capability traits for sources, field backend and row store
//! - [`sources`] - Concrete source extractors (HTTP, Apify, Tesseract, PDF)
//! - [`stores`] - Row store implementations
//! - [`security`] - SSRF protection for URL-based sources
//! - [`testing`] - Mock capabilities for tests

pub mod error;
pub mod pipeline;
pub mod security;
pub mod sources;
pub mod stores;
pub mod testing;
pub mod traits;
pub mod types;

#[cfg(feature = "openai")]
pub mod ai;

// Re-export core types at crate root
pub use error::{
    FieldExtractionError, FieldResult, SecurityError, SourceError, SourceResult, StoreError,
    StoreResult, WorkflowError,
};
pub use pipeline::{
    classify_url_only, discover_links, extract_image_urls, extract_links, is_valid_url, merge,
    normalize_url, Extractors, Orchestrator,
};
pub use security::UrlValidator;
pub use traits::{
    fields::FieldExtractor,
    source::{BinaryFetcher, ImageOcr, PdfText, ScrapedPage, UrlSource},
    store::{QueuedUrl, RowStore},
};
pub use types::{
    config::WorkflowConfig,
    record::{EventField, EventRecord, FieldKind, FieldValue},
    request::{ImageInput, WorkflowRequest, WorkflowResponse, WorkflowSummary},
    result::{SourceKind, WorkflowResult},
    schema::{FieldSchema, FieldSpec},
};

// Re-export sources
pub use sources::{
    HttpFetcher, HttpUrlSource, LopdfText, TesseractOcr, ValidatedFetcher, ValidatedUrlSource,
};

#[cfg(feature = "apify")]
pub use sources::ApifyUrlSource;

// Re-export stores
pub use stores::{ledger_row, MemoryRowStore};

#[cfg(feature = "sheets")]
pub use stores::SheetsRowStore;

#[cfg(feature = "openai")]
pub use ai::OpenAIFieldExtractor;

//! Concrete source extractors.
//!
//! - [`HttpUrlSource`] / [`HttpFetcher`] - plain HTTP, no JavaScript
//! - `ApifyUrlSource` - headless browser crawl (feature `apify`)
//! - [`TesseractOcr`] - image text through the Tesseract CLI
//! - [`LopdfText`] - PDF text layer
//!
//! Wrap URL-based sources with [`ValidatedUrlSource`] / [`ValidatedFetcher`]
//! before exposing them to untrusted input.

pub mod http;
pub mod pdf;
pub mod tesseract;

#[cfg(feature = "apify")]
pub mod apify;

pub use http::{HttpFetcher, HttpUrlSource};
pub use pdf::LopdfText;
pub use tesseract::TesseractOcr;

#[cfg(feature = "apify")]
pub use apify::ApifyUrlSource;

pub use crate::traits::source::{ValidatedFetcher, ValidatedUrlSource};

//! The extraction workflow.
//!
//! - [`links`] classifies URL-only text and discovers links and images
//! - [`merge`] folds a fragment into the shared record
//! - [`Orchestrator`] runs the per-source pipelines and the request driver

pub mod links;
pub mod merge;
mod orchestrator;
mod workflow;

pub use links::{
    classify_url_only, discover_links, extract_image_urls, extract_links, is_valid_url,
    normalize_url,
};
pub use merge::merge;
pub use orchestrator::{Extractors, Orchestrator};

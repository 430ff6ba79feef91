//! Core trait abstractions for the extraction workflow.
//!
//! One capability trait per source kind, one for the field backend and one
//! for the row store. Concrete implementations are chosen by explicit
//! construction and injected into the orchestrator.

pub mod fields;
pub mod source;
pub mod store;

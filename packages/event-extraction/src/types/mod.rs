//! Data types for the extraction workflow.

pub mod config;
pub mod record;
pub mod request;
pub mod result;
pub mod schema;

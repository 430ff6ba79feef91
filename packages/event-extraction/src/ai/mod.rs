//! Field-extraction backends.
//!
//! Reference implementations of [`FieldExtractor`](crate::FieldExtractor).
//! Users can use these directly or implement their own.

mod openai;

pub use openai::OpenAIFieldExtractor;

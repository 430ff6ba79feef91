//! Field-extraction backend trait.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::FieldResult;
use crate::types::schema::FieldSchema;

/// Text plus field schema to a best-effort field map.
///
/// Implementations wrap a language model. The orchestrator truncates the
/// text before calling and tolerates extra or missing keys in the answer;
/// anything that is not a JSON object must come back as
/// [`FieldExtractionError::Malformed`](crate::FieldExtractionError::Malformed).
#[async_trait]
pub trait FieldExtractor: Send + Sync {
    async fn extract_fields(&self, text: &str, schema: &FieldSchema)
        -> FieldResult<Map<String, Value>>;

    /// Name for logging.
    fn name(&self) -> &str {
        "unknown"
    }
}

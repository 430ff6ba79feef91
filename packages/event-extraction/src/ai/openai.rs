//! OpenAI implementation of the field-extraction backend.
//!
//! # Example
//!
//! ```rust,ignore
//! use event_extraction::ai::OpenAIFieldExtractor;
//!
//! let fields = OpenAIFieldExtractor::new("sk-...").with_model("gpt-4o");
//! ```

use async_trait::async_trait;
use openai_client::OpenAIClient;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{FieldExtractionError, FieldResult};
use crate::traits::fields::FieldExtractor;
use crate::types::schema::FieldSchema;

const SYSTEM_PROMPT: &str = "You extract structured event details from announcements. \
Reply with a single JSON object and nothing else.";

/// Field extractor backed by an OpenAI chat model in JSON-object mode.
#[derive(Clone)]
pub struct OpenAIFieldExtractor {
    client: OpenAIClient,
    model: String,
}

impl OpenAIFieldExtractor {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_client(OpenAIClient::new(api_key))
    }

    pub fn with_client(client: OpenAIClient) -> Self {
        Self {
            client,
            model: "gpt-4o".to_string(),
        }
    }

    /// Set the chat model (default: gpt-4o).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

/// User prompt listing every schema field as `[name: description (format)]`.
pub(crate) fn build_prompt(text: &str, schema: &FieldSchema) -> String {
    format!(
        "Analyze the text content below, taken from an event announcement.\n\
         Extract the event details into a JSON object with the following properties:\n\
         {}.\n\n\
         The output must be a single JSON object with no other text or formatting. \
         Assign the HttpUrl fields with URL values that appear in the text. \
         Leave out properties the text does not mention.\n\n\
         Text Content:\n{}",
        schema.prompt_fields(),
        text
    )
}

/// Parse the model's reply into a field map.
pub(crate) fn parse_fields(reply: &str) -> FieldResult<Map<String, Value>> {
    let cleaned = openai_client::strip_code_blocks(reply);
    match serde_json::from_str::<Value>(cleaned)? {
        Value::Object(map) => Ok(map),
        other => Err(FieldExtractionError::Malformed(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[async_trait]
impl FieldExtractor for OpenAIFieldExtractor {
    async fn extract_fields(
        &self,
        text: &str,
        schema: &FieldSchema,
    ) -> FieldResult<Map<String, Value>> {
        let reply = self
            .client
            .json_completion(&self.model, SYSTEM_PROMPT, build_prompt(text, schema))
            .await
            .map_err(|e| FieldExtractionError::Backend(Box::new(e)))?;

        let fields = parse_fields(&reply)?;
        debug!(model = %self.model, keys = fields.len(), "Parsed field map");
        Ok(fields)
    }

    fn name(&self) -> &str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::schema::FieldSpec;

    #[test]
    fn test_prompt_lists_schema_fields() {
        let schema = FieldSchema::default()
            .with_field("תאריך", FieldSpec::new("Event date", "DD.MM.YY"));

        let prompt = build_prompt("Summit on 05.06.25", &schema);

        assert!(prompt.contains("[תאריך: Event date (DD.MM.YY)]"));
        assert!(prompt.ends_with("Text Content:\nSummit on 05.06.25"));
    }

    #[test]
    fn test_parse_fields_strips_fences() {
        let fields = parse_fields("```json\n{\"תאריך\": \"05.06.25\"}\n```").unwrap();
        assert_eq!(fields["תאריך"], "05.06.25");
    }

    #[test]
    fn test_parse_fields_rejects_non_objects() {
        assert!(matches!(
            parse_fields("[1, 2]"),
            Err(FieldExtractionError::Malformed(_))
        ));
        assert!(matches!(
            parse_fields("Sorry, I cannot help"),
            Err(FieldExtractionError::Malformed(_))
        ));
    }
}

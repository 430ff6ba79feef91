//! Field schema handed opaquely to the field-extraction backend.

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::record::EventField;

/// Description and expected format of one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub description: String,
    pub format: String,
}

impl FieldSpec {
    pub fn new(description: impl Into<String>, format: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            format: format.into(),
        }
    }
}

/// Mapping from field name to [`FieldSpec`], in file order.
///
/// Loaded once at startup and shared (`Arc<FieldSchema>`) for the process
/// lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldSchema {
    fields: IndexMap<String, FieldSpec>,
}

impl FieldSchema {
    /// Schema covering every record field.
    pub fn builtin() -> Self {
        let fields = EventField::ALL
            .into_iter()
            .map(|f| (f.key().to_string(), FieldSpec::new(f.description(), f.format())))
            .collect();
        Self { fields }
    }

    pub fn from_json_str(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Load a schema file, falling back to [`FieldSchema::builtin`] when the
    /// file is missing, unreadable or empty.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let loaded = std::fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|json| Self::from_json_str(&json).map_err(|e| e.to_string()));

        match loaded {
            Ok(schema) if !schema.is_empty() => {
                info!(path = %path.display(), fields = schema.len(), "Loaded field schema");
                schema
            }
            Ok(_) => {
                warn!(path = %path.display(), "Field schema file is empty, using built-in schema");
                Self::builtin()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read field schema, using built-in schema");
                Self::builtin()
            }
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, spec: FieldSpec) -> Self {
        self.fields.insert(name.into(), spec);
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldSpec)> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Render as `[field: description (format)], ...` for prompts.
    pub fn prompt_fields(&self) -> String {
        self.fields
            .iter()
            .map(|(name, spec)| format!("[{}: {} ({})]", name, spec.description, spec.format))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Default for FieldSchema {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_covers_every_field() {
        let schema = FieldSchema::builtin();
        assert_eq!(schema.len(), EventField::ALL.len());
        assert_eq!(schema.get("תאריך").unwrap().format, "DD.MM.YY");
        assert_eq!(schema.get("משעה").unwrap().format, "HH:MM");
    }

    #[test]
    fn test_parse_preserves_order() {
        let schema = FieldSchema::from_json_str(
            r#"{"b": {"description": "B", "format": "text"},
                "a": {"description": "A", "format": "HH:MM"}}"#,
        )
        .unwrap();

        let names: Vec<_> = schema.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(schema.prompt_fields(), "[b: B (text)], [a: A (HH:MM)]");
    }

    #[test]
    fn test_load_missing_file_falls_back() {
        let schema = FieldSchema::load("/nonexistent/event_details_schema.json");
        assert_eq!(schema, FieldSchema::builtin());
    }
}

//! Structured extraction
//!
//! Applies a caller-supplied schema (and optional natural-language prompt)
//! to a normalized document, producing a value per field. Without a prompt
//! the extraction is rule-based over document structure; with a prompt it
//! defers to a pluggable [`Inference`] provider. Partial field misses never
//! fail the call - only a malformed schema does.

mod infer;
mod rules;
mod schema;

pub use infer::{Inference, InferenceError};
pub use rules::extract_fields;
pub use schema::{FieldKind, FieldSpec, Schema, SchemaError, MAX_SCHEMA_DEPTH};

use crate::normalize::NormalizedDocument;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Outcome of one extract call
///
/// Produced fresh per call; never cached. Fields the document did not
/// satisfy are present with a null value and a matching warning.
#[derive(Debug, Clone)]
pub struct ExtractionResult {
    /// Source URL of the document
    pub url: String,

    /// Echo of the caller's schema
    pub schema: Value,

    /// Extracted value per schema field (null when not found)
    pub fields: BTreeMap<String, Value>,

    /// Human-readable notes on misses and fallbacks
    pub warnings: Vec<String>,
}

/// Schema-driven extractor with an optional prompt-guided path
#[derive(Clone, Default)]
pub struct Extractor {
    inference: Option<Arc<dyn Inference>>,
}

impl Extractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a prompt-guided inference provider
    pub fn with_inference(provider: Arc<dyn Inference>) -> Self {
        Self {
            inference: Some(provider),
        }
    }

    /// Extracts structured fields from a document
    ///
    /// # Errors
    ///
    /// Fails only with [`SchemaError`] when the schema itself is malformed
    /// (not an object, empty field set, unknown types, runaway nesting).
    pub fn extract(
        &self,
        document: &NormalizedDocument,
        schema_value: &Value,
        prompt: Option<&str>,
    ) -> Result<ExtractionResult, SchemaError> {
        let schema = Schema::parse(schema_value)?;

        let (fields, warnings) = match (prompt, &self.inference) {
            (Some(prompt), Some(provider)) => {
                match provider.infer(&document.text, &schema, prompt) {
                    Ok(inferred) => complete_fields(inferred, &schema),
                    Err(error) => {
                        tracing::warn!("inference provider failed: {}", error);
                        let (fields, mut warnings) = extract_fields(document, &schema);
                        warnings.insert(
                            0,
                            format!("inference failed ({}); used rule-based extraction", error),
                        );
                        (fields, warnings)
                    }
                }
            }
            (Some(_), None) => {
                let (fields, mut warnings) = extract_fields(document, &schema);
                warnings.insert(
                    0,
                    "no inference provider configured; prompt ignored, used rule-based extraction"
                        .to_string(),
                );
                (fields, warnings)
            }
            (None, _) => extract_fields(document, &schema),
        };

        Ok(ExtractionResult {
            url: document.url.to_string(),
            schema: schema_value.clone(),
            fields,
            warnings,
        })
    }
}

/// Aligns provider output with the schema: every schema field is present in
/// the result (null + warning when the provider omitted it), and fields the
/// schema does not name are dropped.
fn complete_fields(
    mut inferred: BTreeMap<String, Value>,
    schema: &Schema,
) -> (BTreeMap<String, Value>, Vec<String>) {
    let mut fields = BTreeMap::new();
    let mut warnings = Vec::new();

    for name in schema.fields.keys() {
        match inferred.remove(name) {
            Some(value) => {
                fields.insert(name.clone(), value);
            }
            None => {
                warnings.push(format!("no value inferred for field `{}`", name));
                fields.insert(name.clone(), Value::Null);
            }
        }
    }

    for extra in inferred.keys() {
        tracing::debug!("dropping inferred field `{}` not present in schema", extra);
    }

    (fields, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use url::Url;

    fn doc(html: &str) -> NormalizedDocument {
        use crate::fetch::RawResponse;

        let raw = RawResponse {
            url: Url::parse("https://example.com/item").unwrap(),
            status_code: 200,
            content_type: Some("text/html".to_string()),
            body: html.as_bytes().to_vec(),
            fetched_at: Utc::now(),
            dynamic_content_unsupported: false,
        };
        crate::normalize::normalize(&raw, &Url::parse("https://example.com/item").unwrap())
    }

    struct FixedProvider;

    impl Inference for FixedProvider {
        fn infer(
            &self,
            _text: &str,
            _schema: &Schema,
            _prompt: &str,
        ) -> Result<BTreeMap<String, Value>, InferenceError> {
            let mut fields = BTreeMap::new();
            fields.insert("title".to_string(), json!("Inferred Title"));
            fields.insert("unrelated".to_string(), json!("dropped"));
            Ok(fields)
        }
    }

    struct FailingProvider;

    impl Inference for FailingProvider {
        fn infer(
            &self,
            _text: &str,
            _schema: &Schema,
            _prompt: &str,
        ) -> Result<BTreeMap<String, Value>, InferenceError> {
            Err(InferenceError::Provider("model offline".to_string()))
        }
    }

    #[test]
    fn test_heading_extraction() {
        let document = doc("<html><body><h1>Hello</h1></body></html>");
        let result = Extractor::new()
            .extract(&document, &json!({"title": "string"}), None)
            .unwrap();

        assert_eq!(result.fields.get("title"), Some(&json!("Hello")));
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_empty_schema_fails() {
        let document = doc("<html><body></body></html>");
        let error = Extractor::new()
            .extract(&document, &json!({}), None)
            .unwrap_err();
        assert!(matches!(error, SchemaError::Empty));
    }

    #[test]
    fn test_prompt_without_provider_warns_and_falls_back() {
        let document = doc("<html><body><h1>Hello</h1></body></html>");
        let result = Extractor::new()
            .extract(&document, &json!({"title": "string"}), Some("find the title"))
            .unwrap();

        assert_eq!(result.fields.get("title"), Some(&json!("Hello")));
        assert!(result.warnings[0].contains("no inference provider"));
    }

    #[test]
    fn test_prompt_with_provider() {
        let document = doc("<html><body><h1>Hello</h1></body></html>");
        let extractor = Extractor::with_inference(Arc::new(FixedProvider));
        let result = extractor
            .extract(
                &document,
                &json!({"title": "string", "author": "string"}),
                Some("find fields"),
            )
            .unwrap();

        assert_eq!(result.fields.get("title"), Some(&json!("Inferred Title")));
        // Provider omitted `author`: null plus a warning
        assert_eq!(result.fields.get("author"), Some(&Value::Null));
        assert!(result.warnings.iter().any(|w| w.contains("author")));
        // Provider extras are dropped
        assert!(!result.fields.contains_key("unrelated"));
    }

    #[test]
    fn test_provider_failure_falls_back_to_rules() {
        let document = doc("<html><body><h1>Hello</h1></body></html>");
        let extractor = Extractor::with_inference(Arc::new(FailingProvider));
        let result = extractor
            .extract(&document, &json!({"title": "string"}), Some("find the title"))
            .unwrap();

        assert_eq!(result.fields.get("title"), Some(&json!("Hello")));
        assert!(result.warnings[0].contains("inference failed"));
    }

    #[test]
    fn test_schema_echoed() {
        let document = doc("<html><body><h1>Hello</h1></body></html>");
        let schema = json!({"title": {"type": "string", "description": "page title"}});
        let result = Extractor::new().extract(&document, &schema, None).unwrap();
        assert_eq!(result.schema, schema);
        assert_eq!(result.url, "https://example.com/item");
    }
}

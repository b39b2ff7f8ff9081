//! Pluggable prompt-guided extraction
//!
//! The engine defines only the contract: a provider receives the document's
//! text rendering, the parsed schema, and the caller's prompt, and returns
//! a value per field. Binding to a concrete model is the host's concern.

use crate::extract::Schema;
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors from an inference provider
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("{0}")]
    Provider(String),
}

/// A language-understanding pass over document text
///
/// Implementations may omit fields they cannot resolve; the extractor fills
/// those with null and a warning. Field names not present in the schema are
/// ignored.
pub trait Inference: Send + Sync {
    fn infer(
        &self,
        text: &str,
        schema: &Schema,
        prompt: &str,
    ) -> Result<BTreeMap<String, Value>, InferenceError>;
}

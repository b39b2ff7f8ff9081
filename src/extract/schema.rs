//! Extraction schema descriptors
//!
//! Schemas arrive as JSON: a map from field name to a type descriptor.
//! Descriptors come in a shorthand form (`"title": "string"`) and an object
//! form (`"price": {"type": "number", "description": "unit price"}`); lists
//! carry an `items` descriptor and objects a nested `fields` map.

use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Maximum schema nesting before parsing gives up
///
/// JSON cannot be literally cyclic, but a runaway generated schema can nest
/// arbitrarily deep; past this bound it is rejected as malformed.
pub const MAX_SCHEMA_DEPTH: usize = 8;

/// Errors raised while parsing an extraction schema
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("schema must be a JSON object")]
    NotAnObject,

    #[error("schema has no fields")]
    Empty,

    #[error("field `{field}`: unknown type {kind:?}")]
    UnknownType { field: String, kind: String },

    #[error("field `{field}`: invalid descriptor")]
    InvalidDescriptor { field: String },

    #[error("schema nesting exceeds {MAX_SCHEMA_DEPTH} levels")]
    TooDeep,
}

/// The type a field's extracted value should take
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    String,
    Number,
    Boolean,
    List(Box<FieldKind>),
    Object(BTreeMap<String, FieldSpec>),
}

/// One field's descriptor
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub kind: FieldKind,
    pub description: Option<String>,
}

/// A parsed, validated extraction schema
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub fields: BTreeMap<String, FieldSpec>,
}

impl Schema {
    /// Parses and validates a JSON schema value
    pub fn parse(value: &Value) -> Result<Self, SchemaError> {
        let fields = parse_fields(value, 0)?;

        if fields.is_empty() {
            return Err(SchemaError::Empty);
        }

        Ok(Self { fields })
    }
}

fn parse_fields(
    value: &Value,
    depth: usize,
) -> Result<BTreeMap<String, FieldSpec>, SchemaError> {
    if depth >= MAX_SCHEMA_DEPTH {
        return Err(SchemaError::TooDeep);
    }

    let object = value.as_object().ok_or(SchemaError::NotAnObject)?;

    object
        .iter()
        .map(|(name, descriptor)| parse_spec(name, descriptor, depth).map(|spec| (name.clone(), spec)))
        .collect()
}

fn parse_spec(field: &str, descriptor: &Value, depth: usize) -> Result<FieldSpec, SchemaError> {
    match descriptor {
        Value::String(kind) => Ok(FieldSpec {
            kind: simple_kind(field, kind)?,
            description: None,
        }),
        Value::Object(map) => {
            let kind_name = map
                .get("type")
                .and_then(Value::as_str)
                .ok_or_else(|| SchemaError::InvalidDescriptor {
                    field: field.to_string(),
                })?;

            let description = map
                .get("description")
                .and_then(Value::as_str)
                .map(|s| s.to_string());

            let kind = match kind_name {
                "list" | "array" => {
                    let inner = match map.get("items") {
                        Some(items) => parse_spec(field, items, depth + 1)?.kind,
                        None => FieldKind::String,
                    };
                    FieldKind::List(Box::new(inner))
                }
                "object" => {
                    let nested = map
                        .get("fields")
                        .or_else(|| map.get("properties"))
                        .ok_or_else(|| SchemaError::InvalidDescriptor {
                            field: field.to_string(),
                        })?;
                    FieldKind::Object(parse_fields(nested, depth + 1)?)
                }
                other => simple_kind(field, other)?,
            };

            Ok(FieldSpec { kind, description })
        }
        _ => Err(SchemaError::InvalidDescriptor {
            field: field.to_string(),
        }),
    }
}

fn simple_kind(field: &str, kind: &str) -> Result<FieldKind, SchemaError> {
    match kind {
        "string" | "text" => Ok(FieldKind::String),
        "number" | "integer" | "int" | "float" => Ok(FieldKind::Number),
        "boolean" | "bool" => Ok(FieldKind::Boolean),
        "list" | "array" => Ok(FieldKind::List(Box::new(FieldKind::String))),
        other => Err(SchemaError::UnknownType {
            field: field.to_string(),
            kind: other.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_shorthand_fields() {
        let schema = Schema::parse(&json!({
            "title": "string",
            "price": "number",
            "in_stock": "boolean",
            "tags": "list"
        }))
        .unwrap();

        assert_eq!(schema.fields["title"].kind, FieldKind::String);
        assert_eq!(schema.fields["price"].kind, FieldKind::Number);
        assert_eq!(schema.fields["in_stock"].kind, FieldKind::Boolean);
        assert_eq!(
            schema.fields["tags"].kind,
            FieldKind::List(Box::new(FieldKind::String))
        );
    }

    #[test]
    fn test_descriptor_form() {
        let schema = Schema::parse(&json!({
            "price": {"type": "number", "description": "unit price in USD"}
        }))
        .unwrap();

        assert_eq!(schema.fields["price"].kind, FieldKind::Number);
        assert_eq!(
            schema.fields["price"].description.as_deref(),
            Some("unit price in USD")
        );
    }

    #[test]
    fn test_list_with_items() {
        let schema = Schema::parse(&json!({
            "scores": {"type": "list", "items": "number"}
        }))
        .unwrap();

        assert_eq!(
            schema.fields["scores"].kind,
            FieldKind::List(Box::new(FieldKind::Number))
        );
    }

    #[test]
    fn test_nested_object() {
        let schema = Schema::parse(&json!({
            "author": {"type": "object", "fields": {"name": "string", "age": "number"}}
        }))
        .unwrap();

        match &schema.fields["author"].kind {
            FieldKind::Object(fields) => {
                assert_eq!(fields["name"].kind, FieldKind::String);
                assert_eq!(fields["age"].kind, FieldKind::Number);
            }
            other => panic!("expected object kind, got {:?}", other),
        }
    }

    #[test]
    fn test_type_aliases() {
        let schema = Schema::parse(&json!({
            "a": "text",
            "b": "integer",
            "c": "bool",
            "d": "array"
        }))
        .unwrap();

        assert_eq!(schema.fields["a"].kind, FieldKind::String);
        assert_eq!(schema.fields["b"].kind, FieldKind::Number);
        assert_eq!(schema.fields["c"].kind, FieldKind::Boolean);
    }

    #[test]
    fn test_empty_schema_rejected() {
        assert!(matches!(
            Schema::parse(&json!({})),
            Err(SchemaError::Empty)
        ));
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(matches!(
            Schema::parse(&json!("string")),
            Err(SchemaError::NotAnObject)
        ));
        assert!(matches!(
            Schema::parse(&json!([1, 2])),
            Err(SchemaError::NotAnObject)
        ));
    }

    #[test]
    fn test_unknown_type_rejected() {
        assert!(matches!(
            Schema::parse(&json!({"x": "complex"})),
            Err(SchemaError::UnknownType { .. })
        ));
    }

    #[test]
    fn test_object_without_fields_rejected() {
        assert!(matches!(
            Schema::parse(&json!({"x": {"type": "object"}})),
            Err(SchemaError::InvalidDescriptor { .. })
        ));
    }

    #[test]
    fn test_runaway_nesting_rejected() {
        // Build a schema nested beyond the depth bound
        let mut descriptor = json!("string");
        for _ in 0..(MAX_SCHEMA_DEPTH + 1) {
            descriptor = json!({"type": "object", "fields": {"inner": descriptor}});
        }

        assert!(matches!(
            Schema::parse(&json!({"root": descriptor})),
            Err(SchemaError::TooDeep)
        ));
    }
}

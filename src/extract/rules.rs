//! Rule-based structural extraction
//!
//! Resolves schema fields against document structure without any language
//! model: the page title and headings, `<meta>` tags, microdata `itemprop`
//! attributes, definition lists, and table rows. Fields with no structural
//! match resolve to null with a warning.

use crate::extract::{FieldKind, Schema};
use crate::normalize::NormalizedDocument;
use scraper::{ElementRef, Html, Selector};
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Extracts every schema field from the document
///
/// Returns the field map (null for misses) and accumulated warnings.
pub fn extract_fields(
    document: &NormalizedDocument,
    schema: &Schema,
) -> (BTreeMap<String, Value>, Vec<String>) {
    let html = Html::parse_document(&document.html);
    let mut fields = BTreeMap::new();
    let mut warnings = Vec::new();

    for (name, spec) in &schema.fields {
        let value = resolve_field(&html, document, name, &spec.kind, name, &mut warnings);
        fields.insert(name.clone(), value);
    }

    (fields, warnings)
}

fn resolve_field(
    html: &Html,
    document: &NormalizedDocument,
    name: &str,
    kind: &FieldKind,
    path: &str,
    warnings: &mut Vec<String>,
) -> Value {
    if let FieldKind::Object(nested) = kind {
        // Nested objects resolve their subfields against the whole document
        let mut object = serde_json::Map::new();
        for (sub_name, sub_spec) in nested {
            let sub_path = format!("{}.{}", path, sub_name);
            let value =
                resolve_field(html, document, sub_name, &sub_spec.kind, &sub_path, warnings);
            object.insert(sub_name.clone(), value);
        }
        return Value::Object(object);
    }

    match find_candidate(html, document, name) {
        Some((text, element)) => coerce(path, kind, &text, element, warnings),
        None => {
            warnings.push(format!("no structural match for field `{}`", path));
            Value::Null
        }
    }
}

/// Finds the best structural match for a field name
///
/// Tried in order: the document title (for a field named `title`),
/// `<meta name=...>`, microdata `itemprop`, `<dt>`/`<dd>` pairs,
/// `<th>`/`<td>` pairs, and headings whose text equals the field name.
fn find_candidate<'a>(
    html: &'a Html,
    document: &NormalizedDocument,
    name: &str,
) -> Option<(String, Option<ElementRef<'a>>)> {
    if name.eq_ignore_ascii_case("title") {
        if let Some(title) = &document.title {
            return Some((title.clone(), None));
        }
        if let Some(text) = first_text(html, "h1") {
            return Some((text, None));
        }
    }

    if selector_safe(name) {
        // <meta name="author" content="...">
        if let Ok(selector) = Selector::parse(&format!("meta[name=\"{}\"]", name)) {
            if let Some(element) = html.select(&selector).next() {
                if let Some(content) = element.value().attr("content") {
                    return Some((content.trim().to_string(), None));
                }
            }
        }

        // Microdata: <span itemprop="price">...</span>
        if let Ok(selector) = Selector::parse(&format!("[itemprop=\"{}\"]", name)) {
            if let Some(element) = html.select(&selector).next() {
                if element.value().name() == "meta" {
                    if let Some(content) = element.value().attr("content") {
                        return Some((content.trim().to_string(), None));
                    }
                } else {
                    return Some((text_of(&element), Some(element)));
                }
            }
        }
    }

    // Definition lists: <dt>Author</dt><dd>Jane</dd>
    if let Ok(selector) = Selector::parse("dt") {
        for dt in html.select(&selector) {
            if text_of(&dt).eq_ignore_ascii_case(name) {
                if let Some(dd) = next_sibling_named(&dt, "dd") {
                    return Some((text_of(&dd), Some(dd)));
                }
            }
        }
    }

    // Table rows: <th>Price</th><td>19.99</td>
    if let Ok(selector) = Selector::parse("th") {
        for th in html.select(&selector) {
            if text_of(&th).eq_ignore_ascii_case(name) {
                if let Some(td) = next_sibling_named(&th, "td") {
                    return Some((text_of(&td), Some(td)));
                }
            }
        }
    }

    // A heading whose text equals the field name labels the content after it
    if let Ok(selector) = Selector::parse("h1, h2, h3, h4, h5, h6") {
        for heading in html.select(&selector) {
            if text_of(&heading).eq_ignore_ascii_case(name) {
                if let Some(sibling) = next_sibling_element(&heading) {
                    if !is_heading(&sibling) {
                        return Some((text_of(&sibling), Some(sibling)));
                    }
                }
            }
        }
    }

    None
}

/// Coerces candidate text (or element content) to the field's kind
fn coerce(
    path: &str,
    kind: &FieldKind,
    text: &str,
    element: Option<ElementRef<'_>>,
    warnings: &mut Vec<String>,
) -> Value {
    let trimmed = text.trim();

    match kind {
        FieldKind::String => json!(trimmed),
        FieldKind::Number => match parse_number(trimmed) {
            Some(number) => json!(number),
            None => {
                warnings.push(format!(
                    "field `{}`: cannot parse {:?} as number",
                    path, trimmed
                ));
                Value::Null
            }
        },
        FieldKind::Boolean => match parse_boolean(trimmed) {
            Some(flag) => json!(flag),
            None => {
                warnings.push(format!(
                    "field `{}`: cannot parse {:?} as boolean",
                    path, trimmed
                ));
                Value::Null
            }
        },
        FieldKind::List(inner) => coerce_list(path, inner, trimmed, element, warnings),
        FieldKind::Object(_) => {
            // Handled before candidate lookup; reaching here means a list
            // item descriptor nested an object, which rules cannot resolve
            warnings.push(format!(
                "field `{}`: nested objects are not supported in rule-based lists",
                path
            ));
            Value::Null
        }
    }
}

fn coerce_list(
    path: &str,
    inner: &FieldKind,
    text: &str,
    element: Option<ElementRef<'_>>,
    warnings: &mut Vec<String>,
) -> Value {
    // Prefer real list items under the matched element
    let raw_items: Vec<String> = match element.and_then(|el| list_items(&el)) {
        Some(items) => items,
        None => text
            .split(|c| c == ',' || c == ';')
            .map(|item| item.trim().to_string())
            .filter(|item| !item.is_empty())
            .collect(),
    };

    let values: Vec<Value> = raw_items
        .iter()
        .map(|item| coerce(path, inner, item, None, warnings))
        .filter(|value| !value.is_null())
        .collect();

    Value::Array(values)
}

/// Collects `<li>` texts under an element, if it contains any
fn list_items(element: &ElementRef<'_>) -> Option<Vec<String>> {
    let selector = Selector::parse("li").ok()?;
    let items: Vec<String> = element.select(&selector).map(|li| text_of(&li)).collect();

    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

fn parse_number(text: &str) -> Option<f64> {
    if let Ok(number) = text.parse::<f64>() {
        return Some(number);
    }

    // Fall back to the first numeric run, so "$19.99" or "42 items" work
    let start = text.find(|c: char| c.is_ascii_digit() || c == '-')?;
    let run: String = text[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();

    run.parse::<f64>().ok()
}

fn parse_boolean(text: &str) -> Option<bool> {
    match text.to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

fn selector_safe(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
}

fn text_of(element: &ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn first_text(html: &Html, selector_str: &str) -> Option<String> {
    let selector = Selector::parse(selector_str).ok()?;
    html.select(&selector)
        .next()
        .map(|element| text_of(&element))
        .filter(|text| !text.is_empty())
}

fn next_sibling_element<'a>(element: &ElementRef<'a>) -> Option<ElementRef<'a>> {
    element.next_siblings().find_map(ElementRef::wrap)
}

fn next_sibling_named<'a>(element: &ElementRef<'a>, name: &str) -> Option<ElementRef<'a>> {
    let sibling = next_sibling_element(element)?;
    if sibling.value().name() == name {
        Some(sibling)
    } else {
        None
    }
}

fn is_heading(element: &ElementRef<'_>) -> bool {
    matches!(
        element.value().name(),
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use url::Url;

    fn doc(html: &str) -> NormalizedDocument {
        use crate::fetch::RawResponse;

        let url = Url::parse("https://example.com/item").unwrap();
        let raw = RawResponse {
            url: url.clone(),
            status_code: 200,
            content_type: Some("text/html".to_string()),
            body: html.as_bytes().to_vec(),
            fetched_at: Utc::now(),
            dynamic_content_unsupported: false,
        };
        crate::normalize::normalize(&raw, &url)
    }

    fn extract(html: &str, schema: Value) -> (BTreeMap<String, Value>, Vec<String>) {
        let schema = Schema::parse(&schema).unwrap();
        extract_fields(&doc(html), &schema)
    }

    #[test]
    fn test_title_from_title_tag() {
        let (fields, warnings) = extract(
            "<html><head><title>Page Title</title></head><body><h1>Other</h1></body></html>",
            json!({"title": "string"}),
        );
        assert_eq!(fields["title"], json!("Page Title"));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_title_falls_back_to_heading() {
        let (fields, warnings) = extract(
            "<html><body><h1>Hello</h1></body></html>",
            json!({"title": "string"}),
        );
        assert_eq!(fields["title"], json!("Hello"));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_meta_tag() {
        let (fields, _) = extract(
            r#"<html><head><meta name="author" content="Jane Doe"></head><body></body></html>"#,
            json!({"author": "string"}),
        );
        assert_eq!(fields["author"], json!("Jane Doe"));
    }

    #[test]
    fn test_microdata() {
        let (fields, _) = extract(
            r#"<html><body><span itemprop="price">$19.99</span></body></html>"#,
            json!({"price": "number"}),
        );
        assert_eq!(fields["price"], json!(19.99));
    }

    #[test]
    fn test_definition_list() {
        let (fields, _) = extract(
            "<html><body><dl><dt>Publisher</dt><dd>Acme Press</dd></dl></body></html>",
            json!({"publisher": "string"}),
        );
        assert_eq!(fields["publisher"], json!("Acme Press"));
    }

    #[test]
    fn test_table_row() {
        let (fields, _) = extract(
            "<html><body><table><tr><th>Weight</th><td>2.5 kg</td></tr></table></body></html>",
            json!({"weight": "number"}),
        );
        assert_eq!(fields["weight"], json!(2.5));
    }

    #[test]
    fn test_heading_labels_following_content() {
        let (fields, _) = extract(
            "<html><body><h2>Summary</h2><p>A short overview.</p></body></html>",
            json!({"summary": "string"}),
        );
        assert_eq!(fields["summary"], json!("A short overview."));
    }

    #[test]
    fn test_missing_field_is_null_with_warning() {
        let (fields, warnings) = extract(
            "<html><body><p>nothing useful</p></body></html>",
            json!({"isbn": "string"}),
        );
        assert_eq!(fields["isbn"], Value::Null);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("isbn"));
    }

    #[test]
    fn test_boolean_coercion() {
        let (fields, _) = extract(
            "<html><body><dl><dt>Available</dt><dd>Yes</dd></dl></body></html>",
            json!({"available": "boolean"}),
        );
        assert_eq!(fields["available"], json!(true));
    }

    #[test]
    fn test_number_coercion_failure_warns() {
        let (fields, warnings) = extract(
            "<html><body><dl><dt>Price</dt><dd>call us</dd></dl></body></html>",
            json!({"price": "number"}),
        );
        assert_eq!(fields["price"], Value::Null);
        assert!(warnings[0].contains("price"));
    }

    #[test]
    fn test_list_from_ul() {
        let (fields, _) = extract(
            "<html><body><h2>Tags</h2><ul><li>rust</li><li>crawler</li></ul></body></html>",
            json!({"tags": "list"}),
        );
        assert_eq!(fields["tags"], json!(["rust", "crawler"]));
    }

    #[test]
    fn test_list_from_comma_text() {
        let (fields, _) = extract(
            "<html><body><dl><dt>Tags</dt><dd>alpha, beta, gamma</dd></dl></body></html>",
            json!({"tags": "list"}),
        );
        assert_eq!(fields["tags"], json!(["alpha", "beta", "gamma"]));
    }

    #[test]
    fn test_numeric_list_items() {
        let (fields, _) = extract(
            "<html><body><dl><dt>Scores</dt><dd>1, 2, 3</dd></dl></body></html>",
            json!({"scores": {"type": "list", "items": "number"}}),
        );
        assert_eq!(fields["scores"], json!([1.0, 2.0, 3.0]));
    }

    #[test]
    fn test_nested_object() {
        let (fields, warnings) = extract(
            r#"<html><body>
                <dl><dt>Name</dt><dd>Jane</dd></dl>
                <table><tr><th>Age</th><td>34</td></tr></table>
            </body></html>"#,
            json!({"author": {"type": "object", "fields": {"name": "string", "age": "number"}}}),
        );

        assert_eq!(fields["author"], json!({"name": "Jane", "age": 34.0}));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_partial_misses_never_fail() {
        let (fields, warnings) = extract(
            "<html><body><h1>Hello</h1></body></html>",
            json!({"title": "string", "missing_one": "string", "missing_two": "number"}),
        );

        assert_eq!(fields["title"], json!("Hello"));
        assert_eq!(fields["missing_one"], Value::Null);
        assert_eq!(fields["missing_two"], Value::Null);
        assert_eq!(warnings.len(), 2);
    }
}

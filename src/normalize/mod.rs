//! Content normalization
//!
//! Converts a raw HTTP response into a canonical document: a parsed tree
//! plus three deterministic renderings (markdown, text, html) and the
//! document's outgoing links resolved to absolute URLs. Normalization never
//! fails: malformed markup is parsed best-effort and non-HTML bodies degrade
//! to the raw text in all three renderings.

mod links;
mod markdown;
mod text;

pub use links::extract_links;
pub use markdown::to_markdown;
pub use text::extract_text;

use crate::fetch::RawResponse;
use chrono::{DateTime, Utc};
use scraper::{Html, Selector};
use url::Url;

/// The canonical parsed+rendered form of a fetched page
///
/// Immutable once produced. Renderings are derived purely from the response
/// body, never from wall-clock state, so identical input bytes always yield
/// byte-identical renderings.
#[derive(Debug, Clone)]
pub struct NormalizedDocument {
    /// Source URL (final URL after redirects)
    pub url: Url,

    /// When the underlying response was received
    pub fetched_at: DateTime<Utc>,

    /// HTTP status code of the underlying response
    pub status_code: u16,

    /// Structural markdown rendering
    pub markdown: String,

    /// Serialized parsed tree
    pub html: String,

    /// Whitespace-collapsed visible text
    pub text: String,

    /// Outgoing hyperlinks as absolute URLs, document order, deduplicated
    pub links: Vec<Url>,

    /// Page title, if present
    pub title: Option<String>,

    /// Content-Type header of the underlying response
    pub content_type: Option<String>,

    /// Carried from the fetch: the caller asked for rendered-DOM waiting
    /// that the retrieval path could not provide
    pub dynamic_content_unsupported: bool,
}

/// Normalizes a raw response into a [`NormalizedDocument`]
///
/// HTML bodies are parsed tolerantly (parse errors never surface); any other
/// content type degrades to the raw text for all three renderings with no
/// links.
///
/// # Arguments
///
/// * `raw` - The fetched response
/// * `base_url` - Base for resolving relative hyperlinks
pub fn normalize(raw: &RawResponse, base_url: &Url) -> NormalizedDocument {
    let body = String::from_utf8_lossy(&raw.body);

    if is_html(raw.content_type.as_deref(), &body) {
        let document = Html::parse_document(&body);

        NormalizedDocument {
            url: raw.url.clone(),
            fetched_at: raw.fetched_at,
            status_code: raw.status_code,
            markdown: to_markdown(&document),
            html: document.root_element().html(),
            text: extract_text(&document),
            links: extract_links(&document, base_url),
            title: extract_title(&document),
            content_type: raw.content_type.clone(),
            dynamic_content_unsupported: raw.dynamic_content_unsupported,
        }
    } else {
        // Non-HTML content: all three renderings carry the raw text
        let text = body.into_owned();

        NormalizedDocument {
            url: raw.url.clone(),
            fetched_at: raw.fetched_at,
            status_code: raw.status_code,
            markdown: text.clone(),
            html: text.clone(),
            text,
            links: Vec::new(),
            title: None,
            content_type: raw.content_type.clone(),
            dynamic_content_unsupported: raw.dynamic_content_unsupported,
        }
    }
}

/// Decides whether a body should go through the HTML parse path
///
/// The Content-Type header wins when present; otherwise the body is sniffed
/// for an HTML document prefix.
fn is_html(content_type: Option<&str>, body: &str) -> bool {
    if let Some(content_type) = content_type {
        return content_type.contains("html");
    }

    let head = body.trim_start().get(..64).unwrap_or(body.trim_start());
    let lowered = head.to_ascii_lowercase();
    lowered.starts_with("<!doctype html") || lowered.starts_with("<html")
}

/// Extracts the page title from the parsed document
fn extract_title(document: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;

    document
        .select(&selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

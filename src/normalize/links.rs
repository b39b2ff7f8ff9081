//! Hyperlink extraction

use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Extracts the document's outgoing hyperlinks
///
/// Targets are resolved to absolute URLs against `base_url`, kept in
/// document order, and deduplicated on first sight.
///
/// Excluded: `javascript:`, `mailto:`, `tel:`, and `data:` targets,
/// fragment-only anchors, download links, and anything that is not
/// HTTP(S) after resolution.
pub fn extract_links(document: &Html, base_url: &Url) -> Vec<Url> {
    let mut links = Vec::new();
    let mut seen = HashSet::new();

    let selector = match Selector::parse("a[href]") {
        Ok(selector) => selector,
        Err(_) => return links,
    };

    for element in document.select(&selector) {
        if element.value().attr("download").is_some() {
            continue;
        }

        let href = match element.value().attr("href") {
            Some(href) => href,
            None => continue,
        };

        if let Some(url) = resolve_link(href, base_url) {
            if seen.insert(url.as_str().to_string()) {
                links.push(url);
            }
        }
    }

    links
}

/// Resolves a link href to an absolute URL and validates it
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() {
        return None;
    }

    // Skip special schemes
    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    // Skip fragment-only links (same page anchors)
    if href.starts_with('#') {
        return None;
    }

    match base_url.join(href) {
        Ok(mut absolute) if absolute.scheme() == "http" || absolute.scheme() == "https" => {
            // In-page anchors are not distinct fetch targets
            absolute.set_fragment(None);
            Some(absolute)
        }
        _ => None,
    }
}

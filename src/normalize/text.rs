//! Visible-text rendering

use scraper::{node::Node, ElementRef, Html};

/// Tags whose subtrees carry no visible text
const INVISIBLE_TAGS: &[&str] = &["script", "style", "noscript", "template"];

/// Extracts the whitespace-collapsed visible text of a document
///
/// Script, style, noscript, and template subtrees are skipped; all runs of
/// whitespace collapse to a single space.
pub fn extract_text(document: &Html) -> String {
    let mut text = String::new();
    collect_text(&document.root_element(), &mut text);

    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn collect_text(element: &ElementRef, out: &mut String) {
    if INVISIBLE_TAGS.contains(&element.value().name()) {
        return;
    }

    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                out.push_str(text);
                out.push(' ');
            }
            Node::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    collect_text(&child_element, out);
                }
            }
            _ => {}
        }
    }
}

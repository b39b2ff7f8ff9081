//! Markdown rendering
//!
//! Structural HTML-to-markdown conversion: headings, paragraphs, lists,
//! links, emphasis, and code are preserved; unsupported elements contribute
//! their text content only.

use scraper::{node::Node, ElementRef, Html};

/// Renders the parsed document as markdown
pub fn to_markdown(document: &Html) -> String {
    let mut output = String::new();
    convert_children(&document.root_element(), &mut output, 0);

    collapse_blank_lines(output.trim())
}

fn convert_children(element: &ElementRef, output: &mut String, depth: usize) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => push_text(output, text),
            Node::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    convert_element(&child_element, output, depth);
                }
            }
            _ => {}
        }
    }
}

fn convert_element(element: &ElementRef, output: &mut String, depth: usize) {
    match element.value().name() {
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            let level = element.value().name().as_bytes()[1] - b'0';
            output.push_str("\n\n");
            for _ in 0..level {
                output.push('#');
            }
            output.push(' ');
            convert_children(element, output, depth);
            output.push_str("\n\n");
        }
        "p" => {
            output.push_str("\n\n");
            convert_children(element, output, depth);
            output.push_str("\n\n");
        }
        "strong" | "b" => {
            output.push_str("**");
            convert_children(element, output, depth);
            output.push_str("**");
        }
        "em" | "i" => {
            output.push('*');
            convert_children(element, output, depth);
            output.push('*');
        }
        "code" => {
            output.push('`');
            convert_children(element, output, depth);
            output.push('`');
        }
        "pre" => {
            output.push_str("\n\n```\n");
            push_raw_text(element, output);
            output.push_str("\n```\n\n");
        }
        "a" => {
            if let Some(href) = element.value().attr("href") {
                output.push('[');
                convert_children(element, output, depth);
                output.push_str("](");
                output.push_str(href);
                output.push(')');
            } else {
                convert_children(element, output, depth);
            }
        }
        "ul" | "ol" => {
            output.push('\n');
            convert_children(element, output, depth + 1);
            output.push('\n');
        }
        "li" => {
            output.push('\n');
            for _ in 1..depth {
                output.push_str("  ");
            }
            output.push_str("- ");
            convert_children(element, output, depth);
        }
        "blockquote" => {
            output.push_str("\n\n> ");
            convert_children(element, output, depth);
            output.push_str("\n\n");
        }
        "br" => output.push('\n'),
        "hr" => output.push_str("\n\n---\n\n"),
        "script" | "style" | "noscript" | "template" => {}
        // Unsupported elements drop their markup but keep their content
        _ => convert_children(element, output, depth),
    }
}

/// Appends a text node, collapsing internal whitespace while preserving
/// word boundaries against already-emitted output
fn push_text(output: &mut String, text: &str) {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.is_empty() {
        return;
    }

    let leading_space = text.starts_with(char::is_whitespace);
    if leading_space && !output.is_empty() && !output.ends_with(char::is_whitespace) {
        output.push(' ');
    }

    output.push_str(&collapsed);

    if text.ends_with(char::is_whitespace) {
        output.push(' ');
    }
}

/// Appends the raw text of a subtree without whitespace collapsing (for
/// code blocks)
fn push_raw_text(element: &ElementRef, output: &mut String) {
    let raw: String = element.text().collect();
    output.push_str(raw.trim_matches('\n'));
}

/// Collapses runs of three or more newlines down to exactly two
fn collapse_blank_lines(text: &str) -> String {
    let mut output = String::with_capacity(text.len());
    let mut newlines = 0usize;

    for ch in text.chars() {
        if ch == '\n' {
            newlines += 1;
            if newlines <= 2 {
                output.push(ch);
            }
        } else {
            newlines = 0;
            output.push(ch);
        }
    }

    output
}

//! Read-only helpers over the parsed document tree.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

pub(crate) static TD: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").unwrap());

/// Concatenated descendant text, in node order, untouched.
pub(crate) fn text(el: ElementRef<'_>) -> String {
    el.text().collect()
}

/// Descendant text with surrounding whitespace removed.
pub(crate) fn trimmed_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Text of the first element matching `selector`, or empty.
pub(crate) fn first_text(doc: &Html, selector: &Selector) -> String {
    doc.select(selector).next().map(text).unwrap_or_default()
}

/// Text of each direct child node in document order: text nodes yield their
/// own contents, elements their descendant text, anything else nothing.
pub(crate) fn child_texts(el: ElementRef<'_>) -> Vec<String> {
    el.children()
        .map(|node| {
            if let Some(text_node) = node.value().as_text() {
                text_node.to_string()
            } else if let Some(child) = ElementRef::wrap(node) {
                text(child)
            } else {
                String::new()
            }
        })
        .collect()
}

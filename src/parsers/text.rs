use scraper::{ElementRef, Node};

/// Elements whose text never counts as visible content
const SKIPPED_TAGS: [&str; 4] = ["script", "style", "noscript", "template"];

/// Whitespace-normalized visible text of an element.
///
/// Text nodes are joined with single spaces so adjacent block elements do not
/// run together; script and style contents are skipped.
pub fn element_text(element: &ElementRef) -> String {
    let mut raw = String::new();
    collect_text(element, &mut raw);
    normalize_whitespace_in_segment(&raw)
}

/// Walks the element's subtree, appending text nodes separated by spaces
fn collect_text(element: &ElementRef, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                out.push(' ');
                out.push_str(text);
            }
            Node::Element(el) if SKIPPED_TAGS.contains(&el.name()) => {}
            Node::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    collect_text(&child_element, out);
                }
            }
            _ => {}
        }
    }
}

/// First `count` whitespace-separated tokens of a text, joined by spaces
pub fn leading_words(text: &str, count: usize) -> String {
    text.split_whitespace()
        .take(count)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalizes whitespace within a single line or paragraph
pub fn normalize_whitespace_in_segment(segment: &str) -> String {
    segment.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Uppercases the first character of a tag name (`nav` -> `Nav`)
pub fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

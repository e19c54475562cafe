//! Adaptive Label Sizing — shrinks long text labels so they do not wrap in the
//! fixed-width term-sheet columns.
//!
//! # Targets
//! - any element whose `class` list contains `data-label`
//! - `td`/`th` cells that do not contain a nested `data-label` element
//!
//! # Rules
//! - currency amounts and plain numbers (`$375,000`, `12,500.00`) are never touched
//! - labels shorter than 10 visible characters are left alone
//! - size steps: > 60 → 8, > 50 → 9, > 40 → 10, > 35 → 11, otherwise the default 12
//!
//! The markup is parsed once into a DOM. Lengths come from the decoded text
//! content, not the markup, so running the pass over its own output changes nothing.

use kuchiki::traits::*;
use kuchiki::{ElementData, NodeDataRef, NodeRef};

pub const LABEL_CLASS: &str = "data-label";
pub const DEFAULT_FONT_SIZE: u8 = 12;
const MIN_LABEL_LEN: usize = 10;

const CURRENCY_SYMBOLS: &[char] = &[
    '$', '€', '£', '¥', '₹', '₩', '₽', '¢', '₿', '₱', '₪', '₫', '₴', '₦', '₺',
];

/// Font size for a label of `len` visible characters.
pub fn font_size_for_length(len: usize) -> u8 {
    match len {
        l if l > 60 => 8,
        l if l > 50 => 9,
        l if l > 40 => 10,
        l if l > 35 => 11,
        _ => DEFAULT_FONT_SIZE,
    }
}

/// True for currency amounts and plain numbers, which are values rather than labels.
pub fn is_numeric_value(text: &str) -> bool {
    if text.contains(CURRENCY_SYMBOLS) {
        return true;
    }
    let trimmed = text.trim();
    !trimmed.is_empty()
        && trimmed.chars().any(|c| c.is_ascii_digit())
        && trimmed
            .chars()
            .all(|c| c.is_ascii_digit() || c == ',' || c == '.')
        && trimmed.matches('.').count() <= 1
}

/// The size to annotate a text span with, or `None` to leave it unannotated.
pub fn label_font_size(visible: &str) -> Option<u8> {
    if is_numeric_value(visible) {
        return None;
    }
    let len = visible.chars().count();
    if len < MIN_LABEL_LEN {
        return None;
    }
    match font_size_for_length(len) {
        DEFAULT_FONT_SIZE => None,
        size => Some(size),
    }
}

/// Result of a sizing pass.
#[derive(Debug, Clone)]
pub struct SizedMarkup {
    pub html: String,
    pub labels_sized: usize,
}

/// Annotates every qualifying label in `html` with `font-size: Npx`.
///
/// Markup with nothing to size is returned byte-for-byte. Otherwise the DOM is
/// re-serialized; input without an `<html>` element or doctype comes back as a
/// fragment.
pub fn apply_label_sizing(html: &str) -> SizedMarkup {
    let document = kuchiki::parse_html().one(html);

    let targets: Vec<NodeDataRef<ElementData>> = document
        .descendants()
        .elements()
        .filter(is_target)
        .collect();

    let mut labels_sized = 0;
    for element in &targets {
        let visible = visible_text(&element.as_node().text_contents());
        if let Some(size) = label_font_size(&visible) {
            set_font_size(element, size);
            labels_sized += 1;
        }
    }

    if labels_sized == 0 {
        return SizedMarkup {
            html: html.to_string(),
            labels_sized,
        };
    }

    SizedMarkup {
        html: serialize(&document, is_full_document(html)),
        labels_sized,
    }
}

/// Collapses whitespace the way a browser displays text.
pub fn visible_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_label(element: &ElementData) -> bool {
    let attributes = element.attributes.borrow();
    attributes
        .get("class")
        .is_some_and(|class| class.split_ascii_whitespace().any(|c| c == LABEL_CLASS))
}

fn is_target(element: &NodeDataRef<ElementData>) -> bool {
    if is_label(element) {
        return true;
    }
    matches!(&*element.name.local, "td" | "th")
        && !element
            .as_node()
            .descendants()
            .elements()
            .any(|inner| is_label(&inner))
}

fn set_font_size(element: &ElementData, size: u8) {
    let mut attributes = element.attributes.borrow_mut();
    let style = merge_style(
        attributes.get("style").unwrap_or(""),
        &format!("font-size: {size}px"),
    );
    attributes.insert("style", style);
}

/// Keeps every declaration except `font-size`, then appends the new one.
fn merge_style(existing: &str, declaration: &str) -> String {
    let mut parts: Vec<&str> = existing
        .split(';')
        .map(str::trim)
        .filter(|decl| !decl.is_empty())
        .filter(|decl| {
            decl.split(':')
                .next()
                .map(|prop| !prop.trim().eq_ignore_ascii_case("font-size"))
                .unwrap_or(true)
        })
        .collect();
    parts.push(declaration);
    parts.join("; ")
}

fn is_full_document(html: &str) -> bool {
    let lower = html.to_ascii_lowercase();
    lower.contains("<html") || lower.contains("<!doctype")
}

fn serialize(document: &NodeRef, full_document: bool) -> String {
    if full_document {
        return document.to_string();
    }
    // The parser wraps fragments in html/head/body; emit only their content.
    ["head", "body"]
        .iter()
        .filter_map(|section| document.select_first(section).ok())
        .flat_map(|section| section.as_node().children())
        .map(|child| child.to_string())
        .collect()
}

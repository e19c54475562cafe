//! Placeholder scanning and single-pass substitution.
//!
//! A placeholder is `{{ name }}` where `name` is a bare identifier and the
//! whitespace directly inside the braces is ignored. The template is scanned
//! once into segments; substitution walks those segments and never re-scans a
//! replacement value, so a value containing `{{ other }}` is emitted literally.

use std::borrow::Cow;
use std::collections::BTreeSet;

/// One piece of a scanned template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    Literal(&'a str),
    /// `raw` is the full `{{ ... }}` span, kept so unresolved names can be emitted untouched.
    Placeholder { name: &'a str, raw: &'a str },
}

/// A template scanned into literal text and placeholder spans.
#[derive(Debug, Clone)]
pub struct Template<'a> {
    segments: Vec<Segment<'a>>,
}

/// Result of a substitution pass.
#[derive(Debug, Clone, Default)]
pub struct Substitution {
    pub output: String,
    /// Number of placeholder occurrences replaced.
    pub replaced: usize,
    /// Names the resolver declined, left in the output verbatim.
    pub untouched: BTreeSet<String>,
}

impl<'a> Template<'a> {
    pub fn parse(source: &'a str) -> Self {
        let bytes = source.as_bytes();
        let mut segments = Vec::new();
        let mut literal_start = 0;
        let mut i = 0;

        while i + 1 < bytes.len() {
            if bytes[i] == b'{' && bytes[i + 1] == b'{' {
                if let Some((name, end)) = match_placeholder(source, i) {
                    if literal_start < i {
                        segments.push(Segment::Literal(&source[literal_start..i]));
                    }
                    segments.push(Segment::Placeholder {
                        name,
                        raw: &source[i..end],
                    });
                    i = end;
                    literal_start = end;
                    continue;
                }
            }
            i += 1;
        }

        if literal_start < source.len() {
            segments.push(Segment::Literal(&source[literal_start..]));
        }

        Self { segments }
    }

    #[cfg(test)]
    pub fn segments(&self) -> &[Segment<'a>] {
        &self.segments
    }

    /// Replaces every placeholder the resolver answers for. The resolver is
    /// consulted once per distinct name, so repeated occurrences always get the
    /// identical string.
    pub fn substitute<'v, F>(&self, mut resolve: F) -> Substitution
    where
        F: FnMut(&str) -> Option<Cow<'v, str>>,
    {
        let mut resolved: Vec<(&'a str, Option<Cow<'v, str>>)> = Vec::new();
        let mut result = Substitution::default();

        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => result.output.push_str(text),
                Segment::Placeholder { name, raw } => {
                    let idx = match resolved.iter().position(|(n, _)| n == name) {
                        Some(idx) => idx,
                        None => {
                            resolved.push((*name, resolve(name)));
                            resolved.len() - 1
                        }
                    };
                    match &resolved[idx].1 {
                        Some(value) => {
                            result.output.push_str(value);
                            result.replaced += 1;
                        }
                        None => {
                            result.output.push_str(raw);
                            result.untouched.insert((*name).to_string());
                        }
                    }
                }
            }
        }

        result
    }
}

/// Tries to match `{{ ident }}` starting at byte `start` (which points at `{{`).
/// Returns the identifier and the byte offset just past the closing braces.
fn match_placeholder(source: &str, start: usize) -> Option<(&str, usize)> {
    let bytes = source.as_bytes();
    let mut i = start + 2;

    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }

    let name_start = i;
    match bytes.get(i) {
        Some(b) if b.is_ascii_alphabetic() || *b == b'_' => i += 1,
        _ => return None,
    }
    while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
        i += 1;
    }
    let name_end = i;

    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }

    if bytes.get(i) == Some(&b'}') && bytes.get(i + 1) == Some(&b'}') {
        Some((&source[name_start..name_end], i + 2))
    } else {
        None
    }
}

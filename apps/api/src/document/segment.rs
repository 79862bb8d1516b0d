//! Content segmentation — splits one block of generated experience text into
//! ordered section blocks.
//!
//! Strategies run in order and the first that produces more than one section
//! wins:
//! 1. `\n\n` boundaries followed by a bold `**Company | Role | Dates**` header
//! 2. blank-line paragraphs (only when there are more than two), dropping
//!    fragments of 50 characters or fewer
//! 3. line starts with an all-caps-leading `NAME | ...` header
//! 4. the whole input as a single section
//!
//! Pure and total: no I/O, never fails.

use std::sync::OnceLock;

use regex::Regex;

/// Paragraph fragments at or below this length are dropped by strategy 2.
const MIN_PARAGRAPH_CHARS: usize = 50;

fn bold_header_boundary() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\n\n\*\*[^\n]*?\|[^\n]*?\|[^\n]*?\*\*").expect("bold header pattern is valid")
    })
}

fn paragraph_break() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\n\n+").expect("paragraph pattern is valid"))
}

fn caps_header_line() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\n[A-Z][^a-z\n]*?\s*\|").expect("caps header pattern is valid"))
}

/// Splits `text` into ordered sections. Always returns at least one element;
/// whitespace-only input yields a single empty string.
pub fn segment(text: &str) -> Vec<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return vec![trimmed.to_string()];
    }

    let strategies: [fn(&str) -> Option<Vec<String>>; 3] =
        [split_on_bold_headers, split_on_paragraphs, split_on_caps_headers];

    strategies
        .iter()
        .find_map(|strategy| strategy(text))
        .unwrap_or_else(|| vec![trimmed.to_string()])
}

fn split_on_bold_headers(text: &str) -> Option<Vec<String>> {
    let pattern = bold_header_boundary();
    // Each boundary drops the two newlines; the header stays with its section.
    let cuts = pattern.find_iter(text).map(|m| (m.start(), m.start() + 2));
    let sections = non_empty(cut_at(text, cuts));
    (sections.len() >= 2).then_some(sections)
}

fn split_on_paragraphs(text: &str) -> Option<Vec<String>> {
    let pattern = paragraph_break();
    let paragraphs: Vec<&str> = pattern.split(text).collect();
    if paragraphs.len() <= 2 {
        return None;
    }
    let kept: Vec<String> = paragraphs
        .into_iter()
        .map(str::trim)
        .filter(|p| p.chars().count() > MIN_PARAGRAPH_CHARS)
        .map(String::from)
        .collect();
    (!kept.is_empty()).then_some(kept)
}

fn split_on_caps_headers(text: &str) -> Option<Vec<String>> {
    let pattern = caps_header_line();
    // Zero-width cut: the header line starts the next section.
    let cuts = pattern.find_iter(text).map(|m| (m.start(), m.start()));
    let sections = non_empty(cut_at(text, cuts));
    (sections.len() >= 2).then_some(sections)
}

/// Cuts `text` at each `(end_of_previous, start_of_next)` pair.
fn cut_at(text: &str, cuts: impl Iterator<Item = (usize, usize)>) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    for (end, next) in cuts {
        pieces.push(&text[start..end]);
        start = next;
    }
    pieces.push(&text[start..]);
    pieces
}

fn non_empty(pieces: Vec<&str>) -> Vec<String> {
    pieces
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect()
}

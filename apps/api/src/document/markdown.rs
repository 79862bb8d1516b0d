//! Markdown-to-structure conversion for generated text: `**bold**` and
//! `*italic*` become spans, newlines become line boundaries.

use std::sync::OnceLock;

use regex::Regex;

use crate::document::model::{Line, Span};

fn inline_emphasis() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\*\*(?P<strong>.+?)\*\*|\*(?P<em>.+?)\*").expect("emphasis pattern is valid")
    })
}

fn bullet_prefix() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^([•·\-\*]|\d{1,2}[.)])(\s+|$)").expect("bullet pattern is valid"))
}

/// Converts a section of generated text into lines. Blank lines are dropped
/// and leading bullet glyphs or list numbers are stripped (the renderer
/// draws its own).
pub fn to_lines(section: &str) -> Vec<Line> {
    section
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| bullet_prefix().replace(line, ""))
        .filter(|line| !line.trim().is_empty())
        .map(|line| parse_inline(&line))
        .collect()
}

/// Splits a single line into text, strong, and emphasis spans.
pub fn parse_inline(line: &str) -> Line {
    let mut spans = Vec::new();
    let mut cursor = 0;

    for caps in inline_emphasis().captures_iter(line) {
        let Some(whole) = caps.get(0) else { continue };
        if whole.start() > cursor {
            spans.push(Span::Text(line[cursor..whole.start()].to_string()));
        }
        if let Some(strong) = caps.name("strong") {
            spans.push(Span::Strong(strong.as_str().to_string()));
        } else if let Some(em) = caps.name("em") {
            spans.push(Span::Emphasis(em.as_str().to_string()));
        }
        cursor = whole.end();
    }

    if cursor < line.len() {
        spans.push(Span::Text(line[cursor..].to_string()));
    }
    spans
}

/// Plain text of a line, emphasis removed.
#[cfg(test)]
pub fn plain_text(line: &Line) -> String {
    line.iter()
        .map(|span| match span {
            Span::Text(t) | Span::Strong(t) | Span::Emphasis(t) => t.as_str(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bold_becomes_strong_span() {
        let line = parse_inline("Cut costs by **40%** in Q3");
        assert_eq!(
            line,
            vec![
                Span::Text("Cut costs by ".to_string()),
                Span::Strong("40%".to_string()),
                Span::Text(" in Q3".to_string()),
            ]
        );
    }

    #[test]
    fn test_italic_becomes_emphasis_span() {
        let line = parse_inline("*Remote* role");
        assert_eq!(
            line,
            vec![
                Span::Emphasis("Remote".to_string()),
                Span::Text(" role".to_string())
            ]
        );
    }

    #[test]
    fn test_header_line_in_bold_survives_bullet_stripping() {
        let lines = to_lines("**Acme | Engineer | 2020 - 2022**\n- Shipped the thing");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], vec![Span::Strong("Acme | Engineer | 2020 - 2022".to_string())]);
        assert_eq!(plain_text(&lines[1]), "Shipped the thing");
    }

    #[test]
    fn test_blank_lines_and_bullet_glyphs_are_dropped() {
        let lines = to_lines("• First\n\n· Second\n* Third\n-   \n");
        let texts: Vec<String> = lines.iter().map(plain_text).collect();
        assert_eq!(texts, vec!["First", "Second", "Third"]);
    }

    #[test]
    fn test_list_numbers_are_stripped_but_decimals_are_not() {
        let lines = to_lines("1. Grew revenue 3.5x
2) Hired 12 engineers
3.5x faster builds");
        let texts: Vec<String> = lines.iter().map(plain_text).collect();
        assert_eq!(
            texts,
            vec!["Grew revenue 3.5x", "Hired 12 engineers", "3.5x faster builds"]
        );
    }

    #[test]
    fn test_unterminated_emphasis_stays_literal() {
        let line = parse_inline("5 * 3 equals fifteen");
        assert_eq!(plain_text(&line), "5 * 3 equals fifteen");
    }
}

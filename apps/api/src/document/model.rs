use serde::Serialize;

/// A run of inline text with its emphasis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Span {
    Text(String),
    /// `**bold**`
    Strong(String),
    /// `*italic*`
    Emphasis(String),
}

/// One rendered line: a sequence of spans.
pub type Line = Vec<Span>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Header {
    pub full_name: String,
    /// Each inner list renders as one contact line; empty values are already removed.
    pub contact_lines: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum SectionLayout {
    Bulleted,
    Plain,
}

/// An entry within a section: optional heading/meta plus its lines.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct LineItem {
    pub heading: Option<String>,
    pub meta: Option<String>,
    pub lines: Vec<Line>,
}

impl LineItem {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            lines: vec![vec![Span::Text(text.into())]],
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    pub title: String,
    pub layout: SectionLayout,
    pub items: Vec<LineItem>,
}

/// Structured resume consumed by the renderer. Built per job, discarded after rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentModel {
    pub header: Option<Header>,
    pub sections: Vec<Section>,
}

impl DocumentModel {
    #[cfg(test)]
    pub fn section(&self, title: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.title == title)
    }
}

//! HTML emission for the rendering engine. Layout is intentionally plain; the
//! page box (size and margins) comes from the `PageConfig`.

use crate::document::model::{DocumentModel, Header, Line, LineItem, Section, SectionLayout, Span};
use crate::render::PageConfig;

const STYLE: &str = "\
* { box-sizing: border-box; }
html, body { font: 11pt/1.4 system-ui, -apple-system, 'Segoe UI', Roboto, Arial, sans-serif; color: #111; margin: 0; padding: 0; }
h2 { font-size: 11pt; margin: 12px 0 6px; font-weight: 700; break-after: avoid-page; }
.header { display: flex; justify-content: space-between; margin-bottom: 12px; padding-bottom: 10px; border-bottom: 1px solid #333; }
.header .name { font-size: 17pt; font-weight: 700; }
.header .contacts { text-align: right; font-size: 10pt; color: #666; }
.item { margin-bottom: 8px; break-inside: avoid; }
.item-header { display: flex; justify-content: space-between; font-weight: 700; }
.item-meta { color: #666; font-size: 10pt; font-weight: normal; white-space: nowrap; }
ul { margin: 0; padding-left: 14px; }
li, .line { font-size: 10.5pt; margin-bottom: 4px; }
";

/// Renders the document to a standalone HTML page.
pub fn render_html(doc: &DocumentModel, page: &PageConfig) -> String {
    let mut html = String::with_capacity(4096);
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"UTF-8\">\n<style>\n");
    html.push_str(&format!(
        "@page {{ size: {}; margin: {}in {}in {}in {}in; }}\n",
        page.format.css_name(),
        page.margins.top,
        page.margins.right,
        page.margins.bottom,
        page.margins.left,
    ));
    html.push_str(STYLE);
    html.push_str("</style>\n</head>\n<body>\n");

    if let Some(header) = &doc.header {
        push_header(&mut html, header);
    }
    for section in &doc.sections {
        push_section(&mut html, section);
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn push_header(html: &mut String, header: &Header) {
    html.push_str("<div class=\"header\">\n");
    html.push_str(&format!(
        "<div class=\"name\">{}</div>\n<div class=\"contacts\">\n",
        escape(&header.full_name)
    ));
    for line in &header.contact_lines {
        let joined = line.iter().map(|c| escape(c)).collect::<Vec<_>>().join(" · ");
        html.push_str(&format!("<div>{joined}</div>\n"));
    }
    html.push_str("</div>\n</div>\n");
}

fn push_section(html: &mut String, section: &Section) {
    html.push_str(&format!(
        "<div class=\"section\">\n<h2>{}</h2>\n",
        escape(&section.title)
    ));
    for item in &section.items {
        push_item(html, item, section.layout);
    }
    html.push_str("</div>\n");
}

fn push_item(html: &mut String, item: &LineItem, layout: SectionLayout) {
    html.push_str("<div class=\"item\">\n");
    if item.heading.is_some() || item.meta.is_some() {
        html.push_str(&format!(
            "<div class=\"item-header\"><span>{}</span><span class=\"item-meta\">{}</span></div>\n",
            escape(item.heading.as_deref().unwrap_or_default()),
            escape(item.meta.as_deref().unwrap_or_default()),
        ));
    }
    if !item.lines.is_empty() {
        match layout {
            SectionLayout::Bulleted => {
                html.push_str("<ul>\n");
                for line in &item.lines {
                    html.push_str(&format!("<li>{}</li>\n", line_html(line)));
                }
                html.push_str("</ul>\n");
            }
            SectionLayout::Plain => {
                for line in &item.lines {
                    html.push_str(&format!("<div class=\"line\">{}</div>\n", line_html(line)));
                }
            }
        }
    }
    html.push_str("</div>\n");
}

fn line_html(line: &Line) -> String {
    line.iter()
        .map(|span| match span {
            Span::Text(t) => escape(t),
            Span::Strong(t) => format!("<strong>{}</strong>", escape(t)),
            Span::Emphasis(t) => format!("<em>{}</em>", escape(t)),
        })
        .collect()
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

use scraper::{ElementRef, Html, Selector};

use super::txt::decode_text;
use super::PageContent;

/// Elements whose text never reaches the index.
const SKIPPED: &[&str] = &["script", "style", "noscript", "template", "head", "svg"];

/// Elements that start a new line in the extracted text.
const BLOCKS: &[&str] = &[
    "p", "div", "section", "article", "aside", "header", "footer", "main", "nav", "li", "tr",
    "br", "pre", "blockquote", "table", "ul", "ol", "h1", "h2", "h3", "h4", "h5", "h6",
];

pub(crate) struct HtmlPage {
    pub title: Option<String>,
    pub pages: Vec<PageContent>,
}

pub(crate) fn extract_html(bytes: &[u8]) -> HtmlPage {
    let source = decode_text(bytes);
    let document = Html::parse_document(&source);

    let title = Selector::parse("title")
        .ok()
        .and_then(|sel| document.select(&sel).next())
        .map(|el| collapse_whitespace(&el.text().collect::<String>()))
        .filter(|t| !t.is_empty());

    let headings = Selector::parse("h1, h2, h3")
        .map(|sel| {
            document
                .select(&sel)
                .map(|el| collapse_whitespace(&el.text().collect::<String>()))
                .filter(|h| !h.is_empty())
                .collect()
        })
        .unwrap_or_default();

    let body = Selector::parse("body")
        .ok()
        .and_then(|sel| document.select(&sel).next())
        .unwrap_or_else(|| document.root_element());

    HtmlPage {
        title,
        pages: vec![PageContent {
            page_number: 1,
            text: visible_text(body),
            headings,
        }],
    }
}

fn visible_text(root: ElementRef<'_>) -> String {
    let mut out = String::new();

    for node in root.descendants() {
        if let Some(text) = node.value().as_text() {
            let hidden = node.ancestors().any(|a| {
                a.value()
                    .as_element()
                    .is_some_and(|el| SKIPPED.contains(&el.name()))
            });
            if hidden {
                continue;
            }
            let t = collapse_whitespace(text);
            if t.is_empty() {
                continue;
            }
            if !out.is_empty() && !out.ends_with('\n') {
                out.push(' ');
            }
            out.push_str(&t);
        } else if let Some(el) = node.value().as_element() {
            if BLOCKS.contains(&el.name()) && !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
        }
    }

    out.trim().to_string()
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

//! Text extraction from local files and remote URLs.
//!
//! The content kind is decided by sniffing the bytes first. The extension and
//! MIME tables only refine plain text into Markdown or HTML; they never
//! override a sniffed PDF or HTML signature.

mod extractor;
mod fetch;
mod html;
mod md;
mod pdf;
mod source;
mod txt;

pub use extractor::{DefaultExtractor, Extractor};
pub use fetch::{filename_from_content_disposition, filename_from_url};
pub use source::{parse_source_list, DocumentSource};

use std::fmt;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("invalid document source '{0}'")]
    InvalidSource(String),
    #[error("PDF extraction failed: {0}")]
    PdfError(String),
    #[error("download failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("download of {url} returned HTTP {status}")]
    HttpStatus { url: String, status: u16 },
    #[error("extraction worker failed: {0}")]
    Worker(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// ── Content kinds ───────────────────────────────────────────────────────────

/// How a document's bytes are decoded into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    PlainText,
    Markdown,
    Html,
    Pdf,
}

/// Extension → decoder. Anything not listed relies on sniffing alone.
const EXTENSION_TABLE: &[(&str, ContentKind)] = &[
    ("txt", ContentKind::PlainText),
    ("text", ContentKind::PlainText),
    ("log", ContentKind::PlainText),
    ("csv", ContentKind::PlainText),
    ("py", ContentKind::PlainText),
    ("md", ContentKind::Markdown),
    ("markdown", ContentKind::Markdown),
    ("html", ContentKind::Html),
    ("htm", ContentKind::Html),
    ("xhtml", ContentKind::Html),
    ("pdf", ContentKind::Pdf),
];

/// MIME essence → decoder.
const MIME_TABLE: &[(&str, ContentKind)] = &[
    ("text/plain", ContentKind::PlainText),
    ("text/csv", ContentKind::PlainText),
    ("text/markdown", ContentKind::Markdown),
    ("text/x-markdown", ContentKind::Markdown),
    ("text/html", ContentKind::Html),
    ("application/xhtml+xml", ContentKind::Html),
    ("application/pdf", ContentKind::Pdf),
];

/// Leading bytes of binary formats we never try to read as text.
const BINARY_SIGNATURES: &[&[u8]] = &[
    b"PK\x03\x04",
    b"\x89PNG",
    b"GIF8",
    b"\xFF\xD8\xFF",
    b"\x1F\x8B",
    b"\xD0\xCF\x11\xE0",
];

const SNIFF_LEN: usize = 8192;

impl ContentKind {
    pub fn from_extension(name: &str) -> Option<Self> {
        let (_, ext) = name.rsplit_once('.')?;
        let ext = ext.to_lowercase();
        EXTENSION_TABLE
            .iter()
            .find(|(e, _)| *e == ext)
            .map(|(_, kind)| *kind)
    }

    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or("").trim().to_lowercase();
        MIME_TABLE
            .iter()
            .find(|(m, _)| *m == essence)
            .map(|(_, kind)| *kind)
    }

    /// Classify raw bytes by their signature. `None` means binary or unknown.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(b"%PDF-") {
            return Some(ContentKind::Pdf);
        }
        if BINARY_SIGNATURES.iter().any(|sig| bytes.starts_with(sig)) {
            return None;
        }
        let head = &bytes[..bytes.len().min(SNIFF_LEN)];
        if head.contains(&0) {
            return None;
        }
        let head = head.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(head);
        let prefix = String::from_utf8_lossy(&head[..head.len().min(1024)]).to_lowercase();
        let prefix = prefix.trim_start();
        let is_html = ["<!doctype html", "<html", "<head", "<body"]
            .iter()
            .any(|tag| prefix.starts_with(tag))
            || (prefix.starts_with("<?xml") && prefix.contains("<html"));
        if is_html {
            Some(ContentKind::Html)
        } else {
            Some(ContentKind::PlainText)
        }
    }

    /// Decide the kind from the bytes, using the name and declared MIME type
    /// only to refine sniffed plain text.
    pub fn detect(bytes: &[u8], name: &str, declared_mime: Option<&str>) -> Option<Self> {
        match Self::sniff(bytes)? {
            ContentKind::PlainText => {
                let hinted = declared_mime
                    .and_then(Self::from_mime)
                    .or_else(|| Self::from_extension(name));
                match hinted {
                    Some(kind @ (ContentKind::Markdown | ContentKind::Html)) => Some(kind),
                    _ => Some(ContentKind::PlainText),
                }
            }
            kind => Some(kind),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ContentKind::PlainText => "text",
            ContentKind::Markdown => "markdown",
            ContentKind::Html => "html",
            ContentKind::Pdf => "pdf",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ── Extracted output ────────────────────────────────────────────────────────

/// A page of extracted text with metadata.
#[derive(Debug, Clone)]
pub struct PageContent {
    /// 1-based page number (for PDFs). Always 1 for other kinds.
    pub page_number: usize,
    /// The extracted text content.
    pub text: String,
    /// Headings found on this page (Markdown and HTML).
    pub headings: Vec<String>,
}

/// Result of extracting text from a document.
#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    /// Path or URL the document came from.
    pub source: String,
    /// Detected kind, or `None` when the content was not recognised.
    pub kind: Option<ContentKind>,
    /// Document title, when the format carries one.
    pub title: Option<String>,
    pub pages: Vec<PageContent>,
}

impl ExtractedDocument {
    /// A document whose content type was not recognised. Carries no text.
    pub fn unrecognized(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            kind: None,
            title: None,
            pages: Vec::new(),
        }
    }

    /// Get all text concatenated.
    pub fn full_text(&self) -> String {
        self.pages
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Total character count across all pages.
    pub fn total_chars(&self) -> usize {
        self.pages.iter().map(|p| p.text.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.iter().all(|p| p.text.trim().is_empty())
    }
}

/// Extract text from raw bytes. Unrecognised content yields an empty document
/// with no kind rather than an error.
pub fn extract_bytes(
    bytes: &[u8],
    name: &str,
    declared_mime: Option<&str>,
) -> Result<ExtractedDocument, ExtractionError> {
    let Some(kind) = ContentKind::detect(bytes, name, declared_mime) else {
        return Ok(ExtractedDocument::unrecognized(name));
    };

    let mut title = None;
    let pages = match kind {
        ContentKind::PlainText => txt::extract_txt(bytes)?,
        ContentKind::Markdown => md::extract_md(bytes)?,
        ContentKind::Html => {
            let page = html::extract_html(bytes);
            title = page.title;
            page.pages
        }
        ContentKind::Pdf => pdf::extract_pdf(bytes)?,
    };

    Ok(ExtractedDocument {
        source: name.to_string(),
        kind: Some(kind),
        title,
        pages,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_table_is_exhaustive() {
        for (ext, kind) in EXTENSION_TABLE {
            assert_eq!(ContentKind::from_extension(&format!("file.{ext}")), Some(*kind));
            assert_eq!(
                ContentKind::from_extension(&format!("FILE.{}", ext.to_uppercase())),
                Some(*kind)
            );
        }
        assert_eq!(ContentKind::from_extension("archive.docx"), None);
        assert_eq!(ContentKind::from_extension("README"), None);
    }

    #[test]
    fn mime_table_is_exhaustive() {
        for (mime, kind) in MIME_TABLE {
            assert_eq!(ContentKind::from_mime(mime), Some(*kind));
        }
        assert_eq!(
            ContentKind::from_mime("text/html; charset=utf-8"),
            Some(ContentKind::Html)
        );
        assert_eq!(ContentKind::from_mime("application/octet-stream"), None);
    }

    #[test]
    fn sniffs_signatures() {
        assert_eq!(ContentKind::sniff(b"%PDF-1.7\n..."), Some(ContentKind::Pdf));
        assert_eq!(
            ContentKind::sniff(b"\n  <!DOCTYPE html><html></html>"),
            Some(ContentKind::Html)
        );
        assert_eq!(ContentKind::sniff(b"<html><body>x</body></html>"), Some(ContentKind::Html));
        assert_eq!(ContentKind::sniff(b"plain words"), Some(ContentKind::PlainText));
        assert_eq!(ContentKind::sniff(b""), Some(ContentKind::PlainText));
        assert_eq!(ContentKind::sniff(b"\x89PNG\r\n\x1a\n"), None);
        assert_eq!(ContentKind::sniff(b"PK\x03\x04rest"), None);
        assert_eq!(ContentKind::sniff(b"abc\0def"), None);
    }

    #[test]
    fn sniffing_beats_extension() {
        // A PDF saved as .txt is still a PDF.
        assert_eq!(
            ContentKind::detect(b"%PDF-1.4", "notes.txt", None),
            Some(ContentKind::Pdf)
        );
        // HTML markup in a .txt file is HTML.
        assert_eq!(
            ContentKind::detect(b"<html><body>hi</body></html>", "page.txt", None),
            Some(ContentKind::Html)
        );
        // Binary content with a text extension is unrecognised.
        assert_eq!(ContentKind::detect(b"\x89PNG\r\n", "image.txt", None), None);
    }

    #[test]
    fn hints_refine_plain_text() {
        assert_eq!(
            ContentKind::detect(b"# Title", "readme.md", None),
            Some(ContentKind::Markdown)
        );
        assert_eq!(
            ContentKind::detect(b"<p>fragment</p>", "frag.html", None),
            Some(ContentKind::Html)
        );
        assert_eq!(
            ContentKind::detect(b"# Title", "download", Some("text/markdown")),
            Some(ContentKind::Markdown)
        );
        // A PDF hint cannot turn text into a PDF.
        assert_eq!(
            ContentKind::detect(b"just text", "fake.pdf", None),
            Some(ContentKind::PlainText)
        );
    }

    #[test]
    fn unrecognised_bytes_give_empty_document() {
        let doc = extract_bytes(b"\x89PNG\r\n\x1a\n\0\0", "logo.png", None).unwrap();
        assert!(doc.kind.is_none());
        assert!(doc.is_empty());
        assert_eq!(doc.full_text(), "");
    }

    #[test]
    fn extracts_html_title_and_text() {
        let doc = extract_bytes(
            b"<html><head><title>Doc</title></head><body><p>Body text.</p></body></html>",
            "page.html",
            None,
        )
        .unwrap();
        assert_eq!(doc.kind, Some(ContentKind::Html));
        assert_eq!(doc.title.as_deref(), Some("Doc"));
        assert_eq!(doc.full_text(), "Body text.");
    }

    #[test]
    fn full_text_joins_pages() {
        let doc = ExtractedDocument {
            source: "x.pdf".into(),
            kind: Some(ContentKind::Pdf),
            title: None,
            pages: vec![
                PageContent { page_number: 1, text: "one".into(), headings: vec![] },
                PageContent { page_number: 2, text: "two".into(), headings: vec![] },
            ],
        };
        assert_eq!(doc.full_text(), "one\n\ntwo");
        assert_eq!(doc.total_chars(), 6);
    }
}

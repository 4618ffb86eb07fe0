use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use url::Url;

use super::ExtractionError;

/// Where a document comes from: a local file or an `http(s)` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentSource {
    Path(PathBuf),
    Url(Url),
}

impl DocumentSource {
    /// Parse a raw reference as typed by a user or read from a list file.
    ///
    /// Trailing whitespace, `" \n"` sequences and URL-encoded newlines (`%0A`)
    /// are removed first. Anything starting with `http://` or `https://`
    /// (case-insensitive) is a URL; everything else is a path.
    pub fn parse(raw: &str) -> Result<Self, ExtractionError> {
        let cleaned = clean_reference(raw);
        if cleaned.is_empty() {
            return Err(ExtractionError::InvalidSource(raw.to_string()));
        }

        let lower = cleaned.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            let url = Url::parse(&cleaned)
                .map_err(|e| ExtractionError::InvalidSource(format!("{cleaned}: {e}")))?;
            Ok(Self::Url(url))
        } else {
            Ok(Self::Path(PathBuf::from(cleaned)))
        }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Self {
        Self::Path(path.as_ref().to_path_buf())
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Url(_))
    }

    /// Stable label used for chunk ids and the `source` metadata field.
    pub fn label(&self) -> String {
        match self {
            Self::Path(p) => p.display().to_string(),
            Self::Url(u) => u.to_string(),
        }
    }
}

impl fmt::Display for DocumentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl FromStr for DocumentSource {
    type Err = ExtractionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn clean_reference(raw: &str) -> String {
    raw.trim_end()
        .replace(" \n", "")
        .replace("%0A", "")
        .trim()
        .to_string()
}

/// Parse a list file: one reference per line, blank lines and `#` comments ignored.
pub fn parse_source_list(content: &str) -> Result<Vec<DocumentSource>, ExtractionError> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(DocumentSource::parse)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_urls_case_insensitively() {
        let src = DocumentSource::parse("HTTPS://example.com/a.pdf").unwrap();
        assert!(src.is_remote());
        assert_eq!(src.label(), "https://example.com/a.pdf");

        let src = DocumentSource::parse("http://example.com").unwrap();
        assert!(matches!(src, DocumentSource::Url(_)));
    }

    #[test]
    fn everything_else_is_a_path() {
        assert_eq!(
            DocumentSource::parse("docs/notes.txt").unwrap(),
            DocumentSource::Path(PathBuf::from("docs/notes.txt"))
        );
        // Not a URL scheme we fetch.
        assert!(!DocumentSource::parse("ftp://host/file").unwrap().is_remote());
    }

    #[test]
    fn cleans_encoded_newlines() {
        let src = DocumentSource::parse("https://example.com/doc.pdf%0A  \n").unwrap();
        assert_eq!(src.label(), "https://example.com/doc.pdf");

        let src = DocumentSource::parse("notes.txt \n").unwrap();
        assert_eq!(src, DocumentSource::from_path("notes.txt"));
    }

    #[test]
    fn rejects_blank_and_malformed() {
        assert!(matches!(
            DocumentSource::parse("   "),
            Err(ExtractionError::InvalidSource(_))
        ));
        assert!(matches!(
            DocumentSource::parse("https://"),
            Err(ExtractionError::InvalidSource(_))
        ));
    }

    #[test]
    fn list_skips_comments_and_blanks() {
        let list = "# sources\n\nhttps://example.com/a.html\n  docs/b.md  \n# done\n";
        let sources = parse_source_list(list).unwrap();
        assert_eq!(sources.len(), 2);
        assert!(sources[0].is_remote());
        assert_eq!(sources[1], DocumentSource::from_path("docs/b.md"));
    }

    #[test]
    fn from_str_matches_parse() {
        let src: DocumentSource = "a.txt".parse().unwrap();
        assert_eq!(src, DocumentSource::from_path("a.txt"));
    }
}

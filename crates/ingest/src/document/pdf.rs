use tracing::debug;

use super::{ExtractionError, PageContent};

pub fn extract_pdf(bytes: &[u8]) -> Result<Vec<PageContent>, ExtractionError> {
    let text = pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| ExtractionError::PdfError(e.to_string()))?;

    let pages = split_pages(&text);
    if pages.is_empty() {
        // Scanned or image-only PDFs decode to nothing.
        debug!("PDF contained no extractable text");
    }
    Ok(pages)
}

/// pdf-extract separates pages with form feeds. Blank pages are dropped but
/// page numbers stay aligned with the source document.
fn split_pages(text: &str) -> Vec<PageContent> {
    text.split('\x0C')
        .enumerate()
        .filter(|(_, page)| !page.trim().is_empty())
        .map(|(i, page)| PageContent {
            page_number: i + 1,
            text: page.trim().to_string(),
            headings: Vec::new(),
        })
        .collect()
}

use super::txt::decode_text;
use super::{ExtractionError, PageContent};

/// Markdown is indexed as-is; only ATX headings outside code fences are collected.
pub fn extract_md(bytes: &[u8]) -> Result<Vec<PageContent>, ExtractionError> {
    let text = decode_text(bytes);

    let mut in_fence = false;
    let mut headings = Vec::new();
    for line in text.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            continue;
        }
        let level = trimmed.chars().take_while(|c| *c == '#').count();
        if (1..=6).contains(&level) {
            let rest = &trimmed[level..];
            if rest.is_empty() || rest.starts_with(' ') {
                let heading = rest.trim().trim_end_matches('#').trim();
                if !heading.is_empty() {
                    headings.push(heading.to_string());
                }
            }
        }
    }

    Ok(vec![PageContent {
        page_number: 1,
        text: text.trim().to_string(),
        headings,
    }])
}

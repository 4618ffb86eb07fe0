use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::fetch::fetch_url;
use super::{extract_bytes, DocumentSource, ExtractedDocument, ExtractionError};

/// Turns a document reference into extracted text.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, source: &DocumentSource) -> Result<ExtractedDocument, ExtractionError>;
}

/// Reads local files with tokio, downloads URLs with reqwest and decodes on
/// the blocking pool.
#[derive(Clone)]
pub struct DefaultExtractor {
    client: Client,
}

impl DefaultExtractor {
    pub fn new(timeout: Duration) -> Result<Self, ExtractionError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("ragline/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Extractor for DefaultExtractor {
    async fn extract(&self, source: &DocumentSource) -> Result<ExtractedDocument, ExtractionError> {
        let (bytes, name, mime) = match source {
            DocumentSource::Path(path) => {
                let bytes = tokio::fs::read(path).await?;
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                (bytes::Bytes::from(bytes), name, None)
            }
            DocumentSource::Url(url) => {
                let fetched = fetch_url(&self.client, url).await?;
                (fetched.bytes, fetched.filename, fetched.content_type)
            }
        };

        // PDF and HTML parsing are CPU-bound.
        let mut doc = tokio::task::spawn_blocking(move || {
            extract_bytes(&bytes, &name, mime.as_deref())
        })
        .await
        .map_err(|e| ExtractionError::Worker(e.to_string()))??;

        doc.source = source.label();
        debug!(
            source = %doc.source,
            kind = doc.kind.map(|k| k.label()).unwrap_or("unrecognized"),
            chars = doc.total_chars(),
            "extracted"
        );
        Ok(doc)
    }
}

use std::fmt;
use std::time::Duration;

/// Outcome for one document in an ingestion run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentStatus {
    /// Every chunk was embedded and indexed.
    Indexed,
    /// Recognised content that produced no chunks.
    Empty,
    /// The content type was not recognised; nothing was extracted.
    Unrecognized,
    /// Extraction failed; the document was skipped.
    Skipped { reason: String },
    /// Some chunks failed after retries under the `skip` failure policy.
    Partial { indexed: usize, failed: usize },
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentStatus::Indexed => f.write_str("indexed"),
            DocumentStatus::Empty => f.write_str("empty"),
            DocumentStatus::Unrecognized => f.write_str("unrecognized"),
            DocumentStatus::Skipped { reason } => write!(f, "skipped ({reason})"),
            DocumentStatus::Partial { indexed, failed } => {
                write!(f, "partial ({indexed} indexed, {failed} failed)")
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct DocumentReport {
    pub source: String,
    pub status: DocumentStatus,
    /// Chunks produced by the chunker, whether or not they were all indexed.
    pub chunks: usize,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    /// One entry per source, in input order.
    pub documents: Vec<DocumentReport>,
    pub elapsed: Duration,
}

impl IngestReport {
    pub fn total_chunks(&self) -> usize {
        self.documents.iter().map(|d| d.chunks).sum()
    }

    pub fn count(&self, pred: impl Fn(&DocumentStatus) -> bool) -> usize {
        self.documents.iter().filter(|d| pred(&d.status)).count()
    }

    pub fn indexed(&self) -> usize {
        self.count(|s| matches!(s, DocumentStatus::Indexed))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, DocumentStatus::Skipped { .. }))
    }
}

impl fmt::Display for IngestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} documents, {} chunks in {:.1}s ({} indexed, {} empty, {} unrecognized, {} skipped, {} partial)",
            self.documents.len(),
            self.total_chunks(),
            self.elapsed.as_secs_f64(),
            self.indexed(),
            self.count(|s| matches!(s, DocumentStatus::Empty)),
            self.count(|s| matches!(s, DocumentStatus::Unrecognized)),
            self.skipped(),
            self.count(|s| matches!(s, DocumentStatus::Partial { .. })),
        )
    }
}

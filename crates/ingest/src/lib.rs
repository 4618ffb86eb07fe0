//! Document ingestion for retrieval: extraction, chunking, embedding and indexing.

pub mod chunker;
pub mod document;
pub mod embedding;
pub mod index;
pub mod pipeline;
pub mod retry;
pub mod tokenize;

pub use chunker::{ChunkError, ChunkStrategy, Chunker};
pub use document::{DefaultExtractor, DocumentSource, ExtractedDocument, ExtractionError, Extractor};
pub use embedding::{Embedder, EmbeddingError};
pub use index::{ChromaIndex, IndexError, IndexRecord, MemoryIndex, VectorIndex};
pub use pipeline::{discover, prepare_collection, IngestError, IngestOptions, IngestReport, Pipeline};
pub use tokenize::{TokenizationError, Tokenizer, UnicodeTokenizer};

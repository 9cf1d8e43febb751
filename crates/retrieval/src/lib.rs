//! Document retrieval for deskmind.
//!
//! Implements [`deskmind_core::RetrievalIndex`] on top of:
//! - [`Chunker`]: sentence-aware token windows with overlap
//! - [`VectorStore`]: a JSONL-persisted collection searched by cosine similarity
//! - [`DocumentLoader`]: plain text files from disk
//!
//! Embeddings and answers both come from a `deskmind_core::Provider`.

pub mod chunker;
pub mod engine;
pub mod loader;
pub mod store;

pub use chunker::Chunker;
pub use engine::{NO_DOCUMENTS_INDEXED, RagEngine};
pub use loader::{Document, DocumentLoader, LoadedDocuments};
pub use store::{ScoredChunk, StoredChunk, VectorStore, cosine_similarity};

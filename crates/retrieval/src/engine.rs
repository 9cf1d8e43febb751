//! Retrieval-augmented answering over the vector store.
//!
//! Indexing: documents are chunked, embedded through the provider's
//! `embed`, and appended to the collection. Answering: the (optionally
//! context-prefixed) question is embedded, the `top_k` most similar chunks
//! are selected, and the LLM model answers from those chunks alone.

use async_trait::async_trait;
use deskmind_config::RetrievalConfig;
use deskmind_core::error::RetrievalError;
use deskmind_core::message::Message;
use deskmind_core::provider::{EmbeddingRequest, Provider, ProviderRequest};
use deskmind_core::retrieval::*;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::chunker::Chunker;
use crate::loader::{Document, DocumentLoader};
use crate::store::{ScoredChunk, StoredChunk, VectorStore};

/// Error text when a question arrives before anything was indexed.
pub const NO_DOCUMENTS_INDEXED: &str = "No documents indexed. Please index documents first.";
const NO_TEXT_TO_INDEX: &str = "No text to index";

const EMBED_BATCH_SIZE: usize = 32;
const EXCERPT_CHARS: usize = 200;

pub struct RagEngine {
    provider: Arc<dyn Provider>,
    store: VectorStore,
    chunker: Chunker,
    embedding_model: String,
    llm_model: String,
    top_k: usize,
}

impl RagEngine {
    /// Open the configured collection, loading any previously indexed chunks.
    pub async fn open(
        provider: Arc<dyn Provider>,
        config: &RetrievalConfig,
    ) -> Result<Self, RetrievalError> {
        let store = VectorStore::open(&config.store_path, &config.collection_name).await?;
        info!(
            collection = %config.collection_name,
            chunks = store.len().await,
            "Retrieval index opened"
        );

        Ok(Self {
            provider,
            store,
            chunker: Chunker::new(config.chunk_size, config.chunk_overlap),
            embedding_model: config.embedding_model.clone(),
            llm_model: config.llm_model.clone(),
            top_k: config.top_k.max(1),
        })
    }

    async fn embed(&self, inputs: Vec<String>) -> Result<Vec<Vec<f32>>, RetrievalError> {
        let mut embeddings = Vec::with_capacity(inputs.len());
        for batch in inputs.chunks(EMBED_BATCH_SIZE) {
            let response = self
                .provider
                .embed(EmbeddingRequest {
                    model: self.embedding_model.clone(),
                    inputs: batch.to_vec(),
                })
                .await
                .map_err(|e| RetrievalError::Embedding(e.to_string()))?;

            if response.embeddings.len() != batch.len() {
                return Err(RetrievalError::Embedding(format!(
                    "expected {} embeddings, got {}",
                    batch.len(),
                    response.embeddings.len()
                )));
            }
            embeddings.extend(response.embeddings);
        }
        Ok(embeddings)
    }

    /// Chunk, embed and store documents; returns the number of chunks added.
    async fn ingest(&self, documents: Vec<Document>) -> Result<usize, RetrievalError> {
        let mut texts = Vec::new();
        let mut metadatas = Vec::new();

        for document in documents {
            for (index, chunk) in self.chunker.split(&document.text).into_iter().enumerate() {
                let mut metadata = document.metadata.clone();
                metadata.insert("chunk_index".into(), Value::from(index));
                texts.push(chunk);
                metadatas.push(metadata);
            }
        }

        if texts.is_empty() {
            return Ok(0);
        }

        let embeddings = self.embed(texts.clone()).await?;
        let records: Vec<StoredChunk> = texts
            .into_iter()
            .zip(metadatas)
            .zip(embeddings)
            .map(|((text, metadata), embedding)| StoredChunk {
                id: uuid::Uuid::new_v4().to_string(),
                text,
                metadata,
                embedding,
            })
            .collect();

        let count = records.len();
        self.store.add(records).await?;
        debug!(chunks = count, "Chunks added to index");
        Ok(count)
    }

    async fn answer(
        &self,
        question: &str,
        context: Option<&str>,
    ) -> Result<RetrievalAnswer, RetrievalError> {
        if self.store.is_empty().await {
            return Ok(RetrievalAnswer::failed(NO_DOCUMENTS_INDEXED));
        }

        let query = compose_question(question, context);
        let query_embedding = self
            .embed(vec![query.clone()])
            .await?
            .pop()
            .ok_or_else(|| RetrievalError::Embedding("no embedding returned".into()))?;

        let hits = self.store.search(&query_embedding, self.top_k).await;
        debug!(hits = hits.len(), "Retrieved passages");

        let prompt = grounded_prompt(&query, &hits);
        let turn = self
            .provider
            .complete(ProviderRequest::new(&self.llm_model, vec![Message::user(prompt)]))
            .await
            .map_err(|e| RetrievalError::Generation(e.to_string()))?;

        let sources = hits.into_iter().map(to_source).collect();
        Ok(RetrievalAnswer::answered(turn.content.trim(), sources))
    }
}

fn grounded_prompt(query: &str, hits: &[ScoredChunk]) -> String {
    let context = hits
        .iter()
        .map(|hit| hit.chunk.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "Context information is below.\n\
         ---------------------\n\
         {context}\n\
         ---------------------\n\
         Given the context information and not prior knowledge, answer the query.\n\
         Query: {query}\n\
         Answer: "
    )
}

fn excerpt(text: &str) -> String {
    if text.chars().count() > EXCERPT_CHARS {
        let head: String = text.chars().take(EXCERPT_CHARS).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

fn to_source(hit: ScoredChunk) -> Source {
    Source {
        text: excerpt(&hit.chunk.text),
        score: Some(hit.score),
        metadata: hit.chunk.metadata,
    }
}

#[async_trait]
impl RetrievalIndex for RagEngine {
    async fn retrieve_and_answer(
        &self,
        question: &str,
        context: Option<&str>,
    ) -> Result<RetrievalAnswer, RetrievalError> {
        match self.answer(question, context).await {
            Ok(answer) => Ok(answer),
            Err(e) => {
                warn!(error = %e, "Retrieval query failed");
                Ok(RetrievalAnswer::failed(e.to_string()))
            }
        }
    }

    async fn index_files(&self, paths: &[String]) -> Result<IndexReport, RetrievalError> {
        let loaded = DocumentLoader::load(paths).await;
        if loaded.documents.is_empty() {
            return Ok(IndexReport::failed("No documents could be loaded"));
        }

        let document_count = loaded.documents.len();
        match self.ingest(loaded.documents).await {
            Ok(chunks) => {
                info!(documents = document_count, chunks, "Indexed documents");
                Ok(IndexReport {
                    success: true,
                    indexed_count: document_count,
                    chars: None,
                    files: loaded.files,
                    error: None,
                })
            }
            Err(e) => {
                warn!(error = %e, "Indexing documents failed");
                Ok(IndexReport::failed(e.to_string()))
            }
        }
    }

    async fn index_text(
        &self,
        text: &str,
        metadata: Map<String, Value>,
    ) -> Result<IndexReport, RetrievalError> {
        let chars = text.chars().count();
        match self.ingest(vec![Document::new(text, metadata)]).await {
            Ok(0) => Ok(IndexReport::failed(NO_TEXT_TO_INDEX)),
            Ok(chunks) => {
                info!(chars, chunks, "Indexed text");
                Ok(IndexReport {
                    success: true,
                    indexed_count: 1,
                    chars: Some(chars),
                    files: Vec::new(),
                    error: None,
                })
            }
            Err(e) => {
                warn!(error = %e, "Indexing text failed");
                Ok(IndexReport::failed(e.to_string()))
            }
        }
    }

    async fn clear(&self) -> Result<ClearReport, RetrievalError> {
        match self.store.clear().await {
            Ok(()) => {
                info!(collection = %self.store.collection(), "Index cleared");
                Ok(ClearReport {
                    success: true,
                    message: Some("All indexed documents cleared".into()),
                    error: None,
                })
            }
            Err(e) => Ok(ClearReport {
                success: false,
                message: None,
                error: Some(e.to_string()),
            }),
        }
    }

    async fn stats(&self) -> Result<IndexStats, RetrievalError> {
        Ok(IndexStats {
            document_count: self.store.len().await,
            collection_name: self.store.collection().to_string(),
            embedding_model: self.embedding_model.clone(),
            llm_model: self.llm_model.clone(),
        })
    }
}

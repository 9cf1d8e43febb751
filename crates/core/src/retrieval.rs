//! Retrieval capability: the document index used for grounded answers.
//!
//! The core only consumes this trait. The concrete engine (chunking,
//! embeddings, vector store) lives in the `deskmind-retrieval` crate.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::RetrievalError;

/// A passage that contributed to a retrieval answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    /// Excerpt of the passage
    pub text: String,

    /// Relevance score (higher is more relevant)
    #[serde(default)]
    pub score: Option<f32>,

    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// Outcome of a retrieval-grounded question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalAnswer {
    pub success: bool,

    #[serde(rename = "response", default)]
    pub response_text: String,

    #[serde(default)]
    pub sources: Vec<Source>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RetrievalAnswer {
    pub fn answered(response_text: impl Into<String>, sources: Vec<Source>) -> Self {
        Self {
            success: true,
            response_text: response_text.into(),
            sources,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            response_text: String::new(),
            sources: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// Outcome of an indexing operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexReport {
    pub success: bool,

    /// Number of documents added to the index
    #[serde(rename = "indexed")]
    pub indexed_count: usize,

    /// Characters indexed (text ingestion only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chars: Option<usize>,

    /// Files that were actually loaded
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl IndexReport {
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            indexed_count: 0,
            chars: None,
            files: Vec::new(),
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClearReport {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexStats {
    #[serde(rename = "total_documents")]
    pub document_count: usize,
    pub collection_name: String,
    pub embedding_model: String,
    pub llm_model: String,
}

/// Prefix a question with caller-supplied context.
pub fn compose_question(question: &str, context: Option<&str>) -> String {
    match context {
        Some(context) if !context.is_empty() => {
            format!("Context: {context}\n\nQuestion: {question}")
        }
        _ => question.to_string(),
    }
}

/// The retrieval capability consumed by the response selector.
#[async_trait]
pub trait RetrievalIndex: Send + Sync {
    /// Answer a question grounded in the indexed passages.
    async fn retrieve_and_answer(
        &self,
        question: &str,
        context: Option<&str>,
    ) -> std::result::Result<RetrievalAnswer, RetrievalError>;

    async fn index_files(&self, paths: &[String]) -> std::result::Result<IndexReport, RetrievalError>;

    async fn index_text(
        &self,
        text: &str,
        metadata: Map<String, Value>,
    ) -> std::result::Result<IndexReport, RetrievalError>;

    async fn clear(&self) -> std::result::Result<ClearReport, RetrievalError>;

    async fn stats(&self) -> std::result::Result<IndexStats, RetrievalError>;
}

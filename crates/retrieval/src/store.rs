//! Vector store: one named collection of embedded chunks, persisted as JSONL.
//!
//! Storage location: `<store_path>/<collection>.jsonl`, one JSON-encoded
//! [`StoredChunk`] per line. Records are loaded when the store is opened and
//! the file is rewritten on every mutation.

use deskmind_core::error::RetrievalError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// An embedded chunk of a source document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredChunk {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    pub embedding: Vec<f32>,
}

/// A chunk ranked against a query.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: StoredChunk,
    pub score: f32,
}

pub struct VectorStore {
    path: PathBuf,
    collection: String,
    records: RwLock<Vec<StoredChunk>>,
}

impl VectorStore {
    /// Open (or lazily create) a collection under `dir`.
    pub async fn open(dir: &Path, collection: &str) -> Result<Self, RetrievalError> {
        let path = dir.join(format!("{collection}.jsonl"));
        let records = Self::load_from_disk(&path).await?;
        debug!(path = %path.display(), count = records.len(), "Vector store loaded");

        Ok(Self {
            path,
            collection: collection.to_string(),
            records: RwLock::new(records),
        })
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of stored chunks.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    async fn load_from_disk(path: &Path) -> Result<Vec<StoredChunk>, RetrievalError> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(RetrievalError::Storage(format!(
                    "Failed to read {}: {e}",
                    path.display()
                )));
            }
        };

        Ok(content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str::<StoredChunk>(line) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(error = %e, "Skipping corrupted index record");
                    None
                }
            })
            .collect())
    }

    async fn flush(&self, records: &[StoredChunk]) -> Result<(), RetrievalError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                RetrievalError::Storage(format!("Failed to create index directory: {e}"))
            })?;
        }

        let mut content = String::new();
        for record in records {
            let line = serde_json::to_string(record).map_err(|e| {
                RetrievalError::Storage(format!("Failed to serialize index record: {e}"))
            })?;
            content.push_str(&line);
            content.push('\n');
        }

        tokio::fs::write(&self.path, content)
            .await
            .map_err(|e| RetrievalError::Storage(format!("Failed to write index file: {e}")))
    }

    /// Append records and persist the collection.
    pub async fn add(&self, new_records: Vec<StoredChunk>) -> Result<(), RetrievalError> {
        if new_records.is_empty() {
            return Ok(());
        }
        let mut records = self.records.write().await;
        let before = records.len();
        records.extend(new_records);

        if let Err(e) = self.flush(&records).await {
            records.truncate(before);
            return Err(e);
        }
        Ok(())
    }

    /// Top `limit` chunks by cosine similarity, most similar first.
    pub async fn search(&self, query_embedding: &[f32], limit: usize) -> Vec<ScoredChunk> {
        let records = self.records.read().await;
        let mut scored: Vec<ScoredChunk> = records
            .iter()
            .map(|record| ScoredChunk {
                score: cosine_similarity(&record.embedding, query_embedding),
                chunk: record.clone(),
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);
        scored
    }

    /// Drop every record and delete the collection file.
    pub async fn clear(&self) -> Result<(), RetrievalError> {
        let mut records = self.records.write().await;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(RetrievalError::Storage(format!(
                    "Failed to delete {}: {e}",
                    self.path.display()
                )));
            }
        }
        records.clear();
        Ok(())
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns a value in [-1, 1]; 0.0 when lengths differ or either vector is empty or zero.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let x = *x as f64;
        let y = *y as f64;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < 1e-10 {
        return 0.0;
    }

    (dot / denom) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: &str, embedding: Vec<f32>) -> StoredChunk {
        StoredChunk {
            id: id.into(),
            text: format!("text of {id}"),
            metadata: Map::new(),
            embedding,
        }
    }

    #[test]
    fn cosine_basics() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[tokio::test]
    async fn search_ranks_by_similarity() {
        let dir = tempfile::tempdir().unwrap();
        let store = VectorStore::open(dir.path(), "docs").await.unwrap();
        store
            .add(vec![
                chunk("far", vec![0.0, 1.0]),
                chunk("near", vec![1.0, 0.1]),
                chunk("exact", vec![1.0, 0.0]),
            ])
            .await
            .unwrap();

        let hits = store.search(&[1.0, 0.0], 2).await;
        let ids: Vec<_> = hits.iter().map(|h| h.chunk.id.as_str()).collect();
        assert_eq!(ids, ["exact", "near"]);
        assert!(hits[0].score >= hits[1].score);
    }

    #[tokio::test]
    async fn records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = VectorStore::open(dir.path(), "electron_docs").await.unwrap();
            store.add(vec![chunk("a", vec![1.0]), chunk("b", vec![0.5])]).await.unwrap();
        }

        let reopened = VectorStore::open(dir.path(), "electron_docs").await.unwrap();
        assert_eq!(reopened.len().await, 2);
        assert!(dir.path().join("electron_docs.jsonl").exists());
    }

    #[tokio::test]
    async fn corrupted_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let good = serde_json::to_string(&chunk("ok", vec![1.0])).unwrap();
        std::fs::write(dir.path().join("docs.jsonl"), format!("{good}\nnot json\n\n")).unwrap();

        let store = VectorStore::open(dir.path(), "docs").await.unwrap();
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn clear_empties_and_deletes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = VectorStore::open(dir.path(), "docs").await.unwrap();
        store.add(vec![chunk("a", vec![1.0])]).await.unwrap();

        store.clear().await.unwrap();
        assert!(store.is_empty().await);
        assert!(!store.path().exists());

        // Clearing an already-empty store is fine
        store.clear().await.unwrap();
    }
}

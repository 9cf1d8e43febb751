//! Loading documents from disk.

use serde_json::{Map, Value};
use std::path::Path;
use tracing::{info, warn};

/// A loaded source document, before chunking.
#[derive(Debug, Clone)]
pub struct Document {
    pub text: String,
    pub metadata: Map<String, Value>,
}

impl Document {
    pub fn new(text: impl Into<String>, metadata: Map<String, Value>) -> Self {
        Self {
            text: text.into(),
            metadata,
        }
    }
}

/// Documents that could be loaded, and the paths they came from.
#[derive(Debug, Default)]
pub struct LoadedDocuments {
    pub documents: Vec<Document>,
    pub files: Vec<String>,
}

pub struct DocumentLoader;

impl DocumentLoader {
    /// Read each path as one UTF-8 text document.
    ///
    /// Missing or unreadable files are skipped with a warning.
    pub async fn load(paths: &[String]) -> LoadedDocuments {
        let mut loaded = LoadedDocuments::default();

        for path in paths {
            let file = Path::new(path);
            match tokio::fs::read_to_string(file).await {
                Ok(text) => {
                    let mut metadata = Map::new();
                    metadata.insert("file_path".into(), Value::String(path.clone()));
                    if let Some(name) = file.file_name() {
                        metadata.insert(
                            "file_name".into(),
                            Value::String(name.to_string_lossy().to_string()),
                        );
                    }
                    info!(path = %path, chars = text.len(), "Loaded document");
                    loaded.documents.push(Document::new(text, metadata));
                    loaded.files.push(path.clone());
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    warn!(path = %path, "File not found, skipping");
                }
                Err(e) => {
                    warn!(path = %path, error = %e, "Could not read file, skipping");
                }
            }
        }

        loaded
    }
}

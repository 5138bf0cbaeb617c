use serde::{Deserialize, Serialize};

use super::Embedding;

/// One ingested photo and its embedding. Never updated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoRecord {
    id: i64,
    file_path: String,
    embedding: Embedding,
}

impl PhotoRecord {
    /// Rebuilds a record from storage. Only stores assign ids.
    pub fn reconstitute(id: i64, file_path: String, embedding: Embedding) -> Self {
        Self {
            id,
            file_path,
            embedding,
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    pub fn embedding(&self) -> &Embedding {
        &self.embedding
    }
}

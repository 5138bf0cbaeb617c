use std::path::Path;

use async_trait::async_trait;

use crate::domain::{EmbeddingConfig, EmbeddingResult};

/// Turns an image on disk into a face embedding.
///
/// The mechanism behind it (subprocess, RPC, in-process model) is an adapter
/// concern; pipelines only see the five-way [`EmbeddingResult`].
#[async_trait]
pub trait EmbeddingService: Send + Sync {
    async fn extract(&self, image_path: &Path) -> EmbeddingResult;

    fn config(&self) -> &EmbeddingConfig;
}

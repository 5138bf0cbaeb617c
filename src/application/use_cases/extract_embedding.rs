use std::path::Path;

use tracing::debug;

use crate::application::EmbeddingService;
use crate::domain::{DomainError, Embedding};

/// Runs the generator on `image_path` and returns a length-checked embedding.
pub(crate) async fn extract_usable_embedding(
    embedding_service: &dyn EmbeddingService,
    image_path: &Path,
) -> Result<Embedding, DomainError> {
    let is_file = tokio::fs::metadata(image_path)
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false);
    if !is_file {
        return Err(DomainError::validation(format!(
            "Image not found: {}",
            image_path.display()
        )));
    }

    let embedding = embedding_service.extract(image_path).await?;

    let expected = embedding_service.config().dimensions();
    if embedding.dimensions() != expected {
        return Err(DomainError::malformed(format!(
            "Generator returned {} dimensions, expected {}",
            embedding.dimensions(),
            expected
        )));
    }

    debug!(
        "Extracted {}-dimensional embedding from {}",
        embedding.dimensions(),
        image_path.display()
    );
    Ok(embedding)
}

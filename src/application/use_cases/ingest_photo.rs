use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use super::extract_embedding::extract_usable_embedding;
use crate::application::{EmbeddingService, PhotoRepository};
use crate::domain::{DomainError, PhotoRecord};

/// Embeds a newly stored image and persists it. Rejections persist nothing.
pub struct IngestPhotoUseCase {
    photo_repo: Arc<dyn PhotoRepository>,
    embedding_service: Arc<dyn EmbeddingService>,
}

impl IngestPhotoUseCase {
    pub fn new(
        photo_repo: Arc<dyn PhotoRepository>,
        embedding_service: Arc<dyn EmbeddingService>,
    ) -> Self {
        Self {
            photo_repo,
            embedding_service,
        }
    }

    /// `image_path` is where the generator reads the image; `reference` is
    /// what gets stored as the record's file path.
    pub async fn execute(
        &self,
        image_path: &Path,
        reference: &str,
    ) -> Result<PhotoRecord, DomainError> {
        info!("Ingesting photo: {}", reference);
        let start_time = Instant::now();

        let embedding =
            match extract_usable_embedding(self.embedding_service.as_ref(), image_path).await {
                Ok(embedding) => embedding,
                Err(e) if e.is_rejection() => {
                    info!("Rejected {}: {}", reference, e);
                    return Err(e);
                }
                Err(e) => {
                    warn!("Failed to embed {}: {}", reference, e);
                    return Err(e);
                }
            };

        let record = self.photo_repo.create(reference, &embedding).await?;

        info!(
            "Stored photo #{} in {:.2}s",
            record.id(),
            start_time.elapsed().as_secs_f64()
        );
        Ok(record)
    }
}

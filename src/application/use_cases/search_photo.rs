use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use super::extract_embedding::extract_usable_embedding;
use crate::application::{EmbeddingService, PhotoRepository};
use crate::domain::{DomainError, SearchOutcome, SearchPolicy};

/// Finds stored photos whose faces look like the one in a query image.
pub struct SearchPhotoUseCase {
    photo_repo: Arc<dyn PhotoRepository>,
    embedding_service: Arc<dyn EmbeddingService>,
    policy: SearchPolicy,
}

impl SearchPhotoUseCase {
    pub fn new(
        photo_repo: Arc<dyn PhotoRepository>,
        embedding_service: Arc<dyn EmbeddingService>,
    ) -> Self {
        Self {
            photo_repo,
            embedding_service,
            policy: SearchPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: SearchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub async fn execute(&self, image_path: &Path) -> Result<SearchOutcome, DomainError> {
        info!(
            "Searching for: {} ({})",
            image_path.display(),
            self.policy.summary()
        );
        let start_time = Instant::now();

        let embedding =
            extract_usable_embedding(self.embedding_service.as_ref(), image_path).await?;

        let neighbors = self
            .photo_repo
            .nearest_neighbors(&embedding, self.policy.max_distance(), self.policy.limit())
            .await?;

        info!(
            "Found {} matches in {:.2}s",
            neighbors.len(),
            start_time.elapsed().as_secs_f64()
        );

        Ok(SearchOutcome::from_neighbors(neighbors))
    }
}

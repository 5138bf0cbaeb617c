use std::path::Path;

use async_trait::async_trait;
use rand::Rng;
use rand::SeedableRng;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::application::EmbeddingService;
use crate::domain::{Embedding, EmbeddingConfig, EmbeddingResult, ExtractionFailure};

/// Deterministic stand-in for the generator: identical bytes give identical
/// unit vectors. Empty files report no face.
pub struct MockEmbedding {
    config: EmbeddingConfig,
}

impl MockEmbedding {
    pub fn new() -> Self {
        Self::with_dimensions(EmbeddingConfig::default().dimensions())
    }

    pub fn with_dimensions(dimensions: usize) -> Self {
        Self {
            config: EmbeddingConfig::new("mock-embedding", dimensions),
        }
    }

    fn generate_embedding(&self, bytes: &[u8]) -> Vec<f32> {
        let digest = Sha256::digest(bytes);
        let mut seed = [0u8; 32];
        seed.copy_from_slice(&digest);

        let mut rng = rand::rngs::StdRng::from_seed(seed);
        let mut vector: Vec<f32> = (0..self.config.dimensions())
            .map(|_| rng.gen_range(-1.0..1.0))
            .collect();

        let magnitude: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for x in &mut vector {
                *x /= magnitude;
            }
        }

        vector
    }
}

impl Default for MockEmbedding {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingService for MockEmbedding {
    async fn extract(&self, image_path: &Path) -> EmbeddingResult {
        let bytes = tokio::fs::read(image_path).await.map_err(|e| {
            ExtractionFailure::execution(
                format!("failed to read {}: {}", image_path.display(), e),
                "",
            )
        })?;

        if bytes.is_empty() {
            return Err(ExtractionFailure::NoFaceDetected);
        }

        let vector = self.generate_embedding(&bytes);
        debug!(
            "Generated mock embedding for {} with {} dimensions",
            image_path.display(),
            vector.len()
        );
        Ok(Embedding::new(vector))
    }

    fn config(&self) -> &EmbeddingConfig {
        &self.config
    }
}

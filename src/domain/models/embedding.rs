use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Face embedding produced by the generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Embedding {
    vector: Vec<f32>,
}

impl Embedding {
    pub fn new(vector: Vec<f32>) -> Self {
        Self { vector }
    }

    pub fn vector(&self) -> &[f32] {
        &self.vector
    }

    pub fn dimensions(&self) -> usize {
        self.vector.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vector.is_empty()
    }

    /// Cosine distance (`1 - cos`) to another vector of the same length.
    ///
    /// Returns `None` when the lengths differ. A zero-norm operand yields 1.0.
    pub fn cosine_distance(&self, other: &[f32]) -> Option<f32> {
        if self.vector.len() != other.len() {
            return None;
        }

        let dot_product: f32 = self.vector.iter().zip(other.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = self.vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = other.iter().map(|x| x * x).sum::<f32>().sqrt();

        if norm_a == 0.0 || norm_b == 0.0 {
            return Some(1.0);
        }

        Some(1.0 - dot_product / (norm_a * norm_b))
    }
}

impl From<Vec<f32>> for Embedding {
    fn from(vector: Vec<f32>) -> Self {
        Self::new(vector)
    }
}

/// Shape of the embeddings this deployment accepts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub model_name: String,
    pub dimensions: usize,
}

impl EmbeddingConfig {
    pub fn new(model_name: impl Into<String>, dimensions: usize) -> Self {
        Self {
            model_name: model_name.into(),
            dimensions,
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Rejects any embedding whose length is not exactly `dimensions`.
    pub fn check(&self, embedding: &Embedding) -> Result<(), DomainError> {
        if embedding.dimensions() != self.dimensions {
            return Err(DomainError::validation(format!(
                "Expected embedding dimension {}, got {}",
                self.dimensions,
                embedding.dimensions()
            )));
        }
        Ok(())
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model_name: "arcface".to_string(),
            dimensions: 512,
        }
    }
}

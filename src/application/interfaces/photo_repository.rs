use async_trait::async_trait;

use crate::domain::{DomainError, Embedding, Neighbor, PhotoRecord};

/// Durable photo/embedding storage and nearest-neighbor queries.
#[async_trait]
pub trait PhotoRepository: Send + Sync {
    /// Inserts one record atomically and returns it with its assigned id.
    async fn create(&self, file_path: &str, embedding: &Embedding)
        -> Result<PhotoRecord, DomainError>;

    /// Records strictly closer than `max_distance`, closest first, ties by id,
    /// at most `limit` of them. Corrupt rows are skipped and logged.
    async fn nearest_neighbors(
        &self,
        query: &Embedding,
        max_distance: f32,
        limit: usize,
    ) -> Result<Vec<Neighbor>, DomainError>;

    async fn get(&self, id: i64) -> Result<Option<PhotoRecord>, DomainError>;

    async fn count(&self) -> Result<u64, DomainError>;
}

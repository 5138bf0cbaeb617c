use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::application::PhotoRepository;
use crate::domain::{
    rank_neighbors, DomainError, Embedding, EmbeddingConfig, Neighbor, PhotoRecord,
};

struct PhotoTable {
    next_id: i64,
    records: Vec<PhotoRecord>,
}

/// Process-local store. Readers share the lock; each insert is one write.
pub struct InMemoryPhotoRepository {
    config: EmbeddingConfig,
    table: RwLock<PhotoTable>,
}

impl InMemoryPhotoRepository {
    pub fn new(config: EmbeddingConfig) -> Self {
        Self {
            config,
            table: RwLock::new(PhotoTable {
                next_id: 1,
                records: Vec::new(),
            }),
        }
    }

    #[cfg(test)]
    async fn insert_unchecked(&self, file_path: &str, embedding: Embedding) -> i64 {
        let mut table = self.table.write().await;
        let id = table.next_id;
        table.next_id += 1;
        table
            .records
            .push(PhotoRecord::reconstitute(id, file_path.to_string(), embedding));
        id
    }
}

impl Default for InMemoryPhotoRepository {
    fn default() -> Self {
        Self::new(EmbeddingConfig::default())
    }
}

#[async_trait]
impl PhotoRepository for InMemoryPhotoRepository {
    async fn create(
        &self,
        file_path: &str,
        embedding: &Embedding,
    ) -> Result<PhotoRecord, DomainError> {
        self.config.check(embedding)?;

        let mut table = self.table.write().await;
        let id = table.next_id;
        table.next_id += 1;

        let record = PhotoRecord::reconstitute(id, file_path.to_string(), embedding.clone());
        table.records.push(record.clone());

        debug!("Saved photo #{} to memory", id);
        Ok(record)
    }

    async fn nearest_neighbors(
        &self,
        query: &Embedding,
        max_distance: f32,
        limit: usize,
    ) -> Result<Vec<Neighbor>, DomainError> {
        self.config.check(query)?;

        let table = self.table.read().await;
        let mut neighbors = Vec::new();

        for record in &table.records {
            if record.embedding().dimensions() != self.config.dimensions() {
                warn!(
                    "Skipping photo #{}: {}",
                    record.id(),
                    DomainError::corruption(format!(
                        "stored embedding has {} dimensions, expected {}",
                        record.embedding().dimensions(),
                        self.config.dimensions()
                    ))
                );
                continue;
            }

            let distance = match query.cosine_distance(record.embedding().vector()) {
                Some(distance) if distance.is_finite() => distance,
                _ => {
                    warn!("Skipping photo #{}: distance is not finite", record.id());
                    continue;
                }
            };

            if distance < max_distance {
                neighbors.push(Neighbor::new(record.clone(), distance));
            }
        }

        rank_neighbors(&mut neighbors);
        neighbors.truncate(limit);
        Ok(neighbors)
    }

    async fn get(&self, id: i64) -> Result<Option<PhotoRecord>, DomainError> {
        let table = self.table.read().await;
        let Some(record) = table.records.iter().find(|r| r.id() == id) else {
            return Ok(None);
        };

        if record.embedding().dimensions() != self.config.dimensions() {
            return Err(DomainError::corruption(format!(
                "photo #{} has {} dimensions, expected {}",
                id,
                record.embedding().dimensions(),
                self.config.dimensions()
            )));
        }
        Ok(Some(record.clone()))
    }

    async fn count(&self) -> Result<u64, DomainError> {
        let table = self.table.read().await;
        Ok(table.records.len() as u64)
    }
}

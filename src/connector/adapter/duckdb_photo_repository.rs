use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use duckdb::types::Value;
use duckdb::{params, Connection};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::application::PhotoRepository;
use crate::domain::{DomainError, Embedding, EmbeddingConfig, Neighbor, PhotoRecord};

/// Photo store backed by a DuckDB file, with an HNSW cosine index when the
/// `vss` extension is available.
pub struct DuckdbPhotoRepository {
    conn: Arc<Mutex<Connection>>,
    config: EmbeddingConfig,
}

impl DuckdbPhotoRepository {
    pub fn new(path: &Path, config: EmbeddingConfig) -> Result<Self, DomainError> {
        let conn = Connection::open(path).map_err(|e| {
            DomainError::persistence(format!("Failed to open DuckDB database: {}", e))
        })?;
        Self::initialize(&conn, &config)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            config,
        })
    }

    pub fn in_memory(config: EmbeddingConfig) -> Result<Self, DomainError> {
        let conn = Connection::open_in_memory().map_err(|e| {
            DomainError::persistence(format!("Failed to open DuckDB in-memory DB: {}", e))
        })?;
        Self::initialize(&conn, &config)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            config,
        })
    }

    /// Creates the sequence, table and index if missing, and checks that an
    /// existing table was created for the same dimensionality.
    fn initialize(conn: &Connection, config: &EmbeddingConfig) -> Result<(), DomainError> {
        let dims = config.dimensions();
        debug!("Initializing DuckDB photo table with FLOAT[{}] embeddings", dims);

        conn.execute_batch(&format!(
            "\
            CREATE SEQUENCE IF NOT EXISTS photos_id_seq START 1;

            CREATE TABLE IF NOT EXISTS photos (
                id BIGINT PRIMARY KEY DEFAULT nextval('photos_id_seq'),
                file_path TEXT NOT NULL,
                embedding FLOAT[{}] NOT NULL
            );
            ",
            dims
        ))
        .map_err(|e| DomainError::persistence(format!("Failed to create photos table: {}", e)))?;

        let column_type: String = conn
            .query_row(
                "SELECT data_type FROM information_schema.columns \
                WHERE table_name = 'photos' AND column_name = 'embedding'",
                [],
                |row| row.get(0),
            )
            .map_err(|e| {
                DomainError::persistence(format!("Failed to inspect photos table: {}", e))
            })?;
        let expected = format!("FLOAT[{}]", dims);
        if !column_type.replace(' ', "").eq_ignore_ascii_case(&expected) {
            return Err(DomainError::corruption(format!(
                "photos.embedding is {}, expected {}",
                column_type, expected
            )));
        }

        if let Err(e) = Self::create_hnsw_index(conn) {
            warn!(
                "HNSW index unavailable ({}). Nearest-neighbor queries will scan the table.",
                e
            );
        }

        Ok(())
    }

    fn create_hnsw_index(conn: &Connection) -> Result<(), duckdb::Error> {
        conn.execute_batch("INSTALL vss;")?;
        conn.execute_batch("LOAD vss;")?;
        conn.execute_batch("SET hnsw_enable_experimental_persistence = true;")?;
        conn.execute_batch(
            "CREATE INDEX IF NOT EXISTS photos_embedding_hnsw ON photos \
            USING HNSW (embedding) WITH (metric = 'cosine');",
        )?;
        debug!("HNSW cosine index ready");
        Ok(())
    }

    fn vector_to_array_literal(&self, vector: &[f32]) -> Result<String, DomainError> {
        if vector.len() != self.config.dimensions() {
            return Err(DomainError::validation(format!(
                "Expected embedding dimension {}, got {}",
                self.config.dimensions(),
                vector.len()
            )));
        }
        if let Some(v) = vector.iter().find(|v| !v.is_finite()) {
            return Err(DomainError::validation(format!(
                "Embedding contains non-finite value {}",
                v
            )));
        }

        let mut s = String::with_capacity(vector.len() * 12);
        s.push('[');
        for (i, v) in vector.iter().enumerate() {
            if i > 0 {
                s.push_str(", ");
            }
            s.push_str(&format!("{:?}", v));
        }
        s.push(']');
        s.push_str(&format!("::FLOAT[{}]", self.config.dimensions()));
        Ok(s)
    }

    /// Decodes an `embedding::FLOAT[]` column value, checking its length.
    fn value_to_embedding(&self, value: Value) -> Result<Embedding, String> {
        let items = match value {
            Value::List(items) => items,
            Value::Null => return Err("embedding is NULL".to_string()),
            other => return Err(format!("unexpected embedding value {:?}", other)),
        };

        let mut vector = Vec::with_capacity(items.len());
        for item in items {
            match item {
                Value::Float(v) => vector.push(v),
                Value::Double(v) => vector.push(v as f32),
                other => return Err(format!("unexpected embedding component {:?}", other)),
            }
        }

        if vector.len() != self.config.dimensions() {
            return Err(format!(
                "stored embedding has {} dimensions, expected {}",
                vector.len(),
                self.config.dimensions()
            ));
        }
        Ok(Embedding::new(vector))
    }

    /// Runs the prepared search with `LIMIT fetch`. Returns the usable
    /// neighbors and the number of rows read.
    fn read_neighbors(
        &self,
        stmt: &mut duckdb::Statement<'_>,
        max_distance: f32,
        fetch: usize,
    ) -> Result<(Vec<Neighbor>, usize), DomainError> {
        let mut rows = stmt
            .query(params![max_distance, fetch as i64])
            .map_err(|e| DomainError::persistence(format!("Failed to run search: {}", e)))?;

        let mut results = Vec::new();
        let mut read = 0;
        while let Some(row) = rows
            .next()
            .map_err(|e| DomainError::persistence(format!("Failed to read row: {}", e)))?
        {
            read += 1;
            let id: i64 = row
                .get(0)
                .map_err(|e| DomainError::persistence(format!("Failed to read id: {}", e)))?;
            let file_path: String = row.get(1).map_err(|e| {
                DomainError::persistence(format!("Failed to read file_path: {}", e))
            })?;
            let value: Value = row.get(2).map_err(|e| {
                DomainError::persistence(format!("Failed to read embedding: {}", e))
            })?;
            let distance: Option<f32> = row.get(3).map_err(|e| {
                DomainError::persistence(format!("Failed to read distance: {}", e))
            })?;

            let embedding = match self.value_to_embedding(value) {
                Ok(embedding) => embedding,
                Err(reason) => {
                    warn!(
                        "Skipping photo #{}: {}",
                        id,
                        DomainError::corruption(reason)
                    );
                    continue;
                }
            };
            let Some(distance) = distance.filter(|d| d.is_finite()) else {
                warn!("Skipping photo #{}: distance is not finite", id);
                continue;
            };

            results.push(Neighbor::new(
                PhotoRecord::reconstitute(id, file_path, embedding),
                distance,
            ));
        }

        Ok((results, read))
    }
}

/// Repeats `search(fetch)` with a larger `fetch` until `limit` usable rows
/// are found or the qualifying rows run out. `search` returns the usable
/// neighbors and how many rows it read; skipped rows do not count toward
/// `limit`.
fn fill_to_limit<F>(limit: usize, mut search: F) -> Result<Vec<Neighbor>, DomainError>
where
    F: FnMut(usize) -> Result<(Vec<Neighbor>, usize), DomainError>,
{
    let mut fetch = limit;
    loop {
        let (mut results, read) = search(fetch)?;
        if results.len() >= limit || read < fetch {
            results.truncate(limit);
            return Ok(results);
        }
        let skipped = read - results.len();
        debug!("Refetching search after skipping {} rows", skipped);
        fetch = limit + skipped;
    }
}

#[async_trait]
impl PhotoRepository for DuckdbPhotoRepository {
    async fn create(
        &self,
        file_path: &str,
        embedding: &Embedding,
    ) -> Result<PhotoRecord, DomainError> {
        let array_lit = self.vector_to_array_literal(embedding.vector())?;

        let mut conn = self.conn.lock().await;
        let tx = conn
            .transaction()
            .map_err(|e| DomainError::persistence(format!("Failed to begin transaction: {}", e)))?;

        // FLOAT[N] values cannot be bound as parameters, so the literal is
        // built from the validated embedding rather than from request input.
        let sql = format!(
            "INSERT INTO photos (file_path, embedding) VALUES (?, {}) RETURNING id",
            array_lit
        );
        let id: i64 = tx
            .query_row(&sql, params![file_path], |row| row.get(0))
            .map_err(|e| {
                DomainError::persistence(format!("Failed to insert photo {}: {}", file_path, e))
            })?;

        tx.commit()
            .map_err(|e| DomainError::persistence(format!("Failed to commit: {}", e)))?;

        debug!("Saved photo #{} to DuckDB", id);
        Ok(PhotoRecord::reconstitute(
            id,
            file_path.to_string(),
            embedding.clone(),
        ))
    }

    async fn nearest_neighbors(
        &self,
        query: &Embedding,
        max_distance: f32,
        limit: usize,
    ) -> Result<Vec<Neighbor>, DomainError> {
        let array_lit = self.vector_to_array_literal(query.vector())?;
        let sql = format!(
            "SELECT id, file_path, embedding::FLOAT[] AS embedding, distance \
            FROM ( \
                SELECT p.id, p.file_path, p.embedding, \
                    array_cosine_distance(p.embedding, {array_lit}) AS distance \
                FROM photos p \
            ) \
            WHERE distance < ? \
            ORDER BY distance ASC, id ASC \
            LIMIT ?",
            array_lit = array_lit
        );

        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| DomainError::persistence(format!("Failed to prepare search: {}", e)))?;

        fill_to_limit(limit, |fetch| {
            self.read_neighbors(&mut stmt, max_distance, fetch)
        })
    }

    async fn get(&self, id: i64) -> Result<Option<PhotoRecord>, DomainError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare("SELECT file_path, embedding::FLOAT[] FROM photos WHERE id = ?")
            .map_err(|e| DomainError::persistence(format!("Failed to prepare lookup: {}", e)))?;
        let mut rows = stmt
            .query(params![id])
            .map_err(|e| DomainError::persistence(format!("Failed to look up photo: {}", e)))?;

        let Some(row) = rows
            .next()
            .map_err(|e| DomainError::persistence(format!("Failed to read row: {}", e)))?
        else {
            return Ok(None);
        };

        let file_path: String = row
            .get(0)
            .map_err(|e| DomainError::persistence(format!("Failed to read file_path: {}", e)))?;
        let value: Value = row
            .get(1)
            .map_err(|e| DomainError::persistence(format!("Failed to read embedding: {}", e)))?;
        let embedding = self
            .value_to_embedding(value)
            .map_err(|reason| DomainError::corruption(format!("photo #{}: {}", id, reason)))?;

        Ok(Some(PhotoRecord::reconstitute(id, file_path, embedding)))
    }

    async fn count(&self) -> Result<u64, DomainError> {
        let conn = self.conn.lock().await;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM photos", [], |row| row.get(0))
            .map_err(|e| DomainError::persistence(format!("Failed to count photos: {}", e)))?;
        Ok(count as u64)
    }
}

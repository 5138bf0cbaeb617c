use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::debug;

use crate::{
    DuckdbPhotoRepository, EmbeddingConfig, EmbeddingService, InMemoryPhotoRepository,
    IngestPhotoUseCase, MockEmbedding, PhotoRepository, ProcessEmbedding, ProcessEmbeddingConfig,
    SearchPhotoUseCase, SearchPolicy, UploadStore,
};

pub struct ContainerConfig {
    pub data_dir: String,
    /// Defaults to `<data_dir>/uploads`.
    pub upload_dir: Option<String>,
    /// Executable that prints `{"success", "embedding", "error"}` for an image.
    pub generator: String,
    pub generator_args: Vec<String>,
    pub timeout_secs: u64,
    pub dimensions: usize,
    pub max_distance: f32,
    pub limit: usize,
    pub memory_storage: bool,
    pub mock_embeddings: bool,
}

impl ContainerConfig {
    pub fn search_policy(&self) -> SearchPolicy {
        SearchPolicy::new(self.max_distance, self.limit)
    }
}

/// Builds adapters once and hands them to use cases.
pub struct Container {
    embedding_service: Arc<dyn EmbeddingService>,
    photo_repo: Arc<dyn PhotoRepository>,
    upload_store: Arc<UploadStore>,
    policy: SearchPolicy,
    config: ContainerConfig,
}

impl Container {
    pub fn new(config: ContainerConfig) -> Result<Self> {
        let embedding_config = EmbeddingConfig::new("arcface", config.dimensions);

        let embedding_service: Arc<dyn EmbeddingService> = if config.mock_embeddings {
            debug!("Using mock embedding service");
            Arc::new(MockEmbedding::with_dimensions(config.dimensions))
        } else {
            let process = ProcessEmbeddingConfig::new(&config.generator)
                .with_args(config.generator_args.clone())
                .with_timeout(Duration::from_secs(config.timeout_secs));
            Arc::new(ProcessEmbedding::new(process, embedding_config.clone()))
        };

        let photo_repo: Arc<dyn PhotoRepository> = if config.memory_storage {
            debug!("Using in-memory photo storage");
            Arc::new(InMemoryPhotoRepository::new(embedding_config))
        } else {
            let db_path = PathBuf::from(&config.data_dir).join("facesearch.duckdb");
            debug!("Using DuckDB photo storage at {:?}", db_path);
            Arc::new(DuckdbPhotoRepository::new(&db_path, embedding_config)?)
        };

        let upload_dir = config
            .upload_dir
            .clone()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(&config.data_dir).join("uploads"));
        let upload_store = Arc::new(UploadStore::new(upload_dir)?);

        Ok(Self {
            embedding_service,
            photo_repo,
            upload_store,
            policy: config.search_policy(),
            config,
        })
    }

    /// Wires caller-supplied adapters, e.g. test doubles.
    pub fn with_services(
        config: ContainerConfig,
        embedding_service: Arc<dyn EmbeddingService>,
        photo_repo: Arc<dyn PhotoRepository>,
        upload_store: Arc<UploadStore>,
    ) -> Self {
        Self {
            embedding_service,
            photo_repo,
            upload_store,
            policy: config.search_policy(),
            config,
        }
    }

    pub fn ingest_use_case(&self) -> IngestPhotoUseCase {
        IngestPhotoUseCase::new(self.photo_repo.clone(), self.embedding_service.clone())
    }

    pub fn search_use_case(&self) -> SearchPhotoUseCase {
        SearchPhotoUseCase::new(self.photo_repo.clone(), self.embedding_service.clone())
            .with_policy(self.policy)
    }

    pub fn photo_repo(&self) -> Arc<dyn PhotoRepository> {
        self.photo_repo.clone()
    }

    pub fn upload_store(&self) -> &UploadStore {
        &self.upload_store
    }

    pub fn embedding_config(&self) -> &EmbeddingConfig {
        self.embedding_service.config()
    }

    pub fn policy(&self) -> SearchPolicy {
        self.policy
    }

    pub fn data_dir(&self) -> &str {
        &self.config.data_dir
    }

    pub fn memory_storage(&self) -> bool {
        self.config.memory_storage
    }
}

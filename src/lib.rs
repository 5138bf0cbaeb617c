pub mod application;
pub mod cli;
pub mod connector;
pub mod domain;

pub use application::{EmbeddingService, IngestPhotoUseCase, PhotoRepository, SearchPhotoUseCase};

pub use cli::Commands;

pub use connector::{
    DuckdbPhotoRepository, InMemoryPhotoRepository, MockEmbedding, ProcessEmbedding,
    ProcessEmbeddingConfig, StoredUpload, UploadStore,
};

pub use domain::{
    DomainError, Embedding, EmbeddingConfig, EmbeddingResult, ErrorKind, ExtractionFailure,
    Neighbor, PhotoRecord, SearchOutcome, SearchPolicy,
};

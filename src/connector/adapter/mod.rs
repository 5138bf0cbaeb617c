mod duckdb_photo_repository;
mod in_memory_photo_repository;
mod mock_embedding;
mod process_embedding;

pub use duckdb_photo_repository::*;
pub use in_memory_photo_repository::*;
pub use mock_embedding::*;
pub use process_embedding::*;

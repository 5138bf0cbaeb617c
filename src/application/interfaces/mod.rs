mod embedding_service;
mod photo_repository;

pub use embedding_service::*;
pub use photo_repository::*;

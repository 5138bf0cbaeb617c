//! # Connector Layer
//!
//! External integrations implementing application interfaces:
//! - Embedding generation (external process, or a deterministic mock)
//! - Photo storage (DuckDB with an HNSW cosine index, or in-memory)
//! - Upload storage on the local filesystem
//! - The CLI controllers and the HTTP server

pub mod adapter;
pub mod api;
pub mod http;
pub mod storage;

pub use adapter::*;
pub use storage::*;

mod extract_embedding;
mod ingest_photo;
mod search_photo;

pub use ingest_photo::*;
pub use search_photo::*;

mod embedding;
mod extraction;
mod photo;
mod search_result;

pub use embedding::*;
pub use extraction::*;
pub use photo::*;
pub use search_result::*;

pub mod ingest_controller;
pub mod search_controller;
pub mod stats_controller;

pub use ingest_controller::IngestController;
pub use search_controller::SearchController;
pub use stats_controller::StatsController;

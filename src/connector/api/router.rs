use anyhow::Result;

use crate::Commands;

use super::container::Container;
use super::controller::{IngestController, SearchController, StatsController};

pub struct Router<'a> {
    ingest_controller: IngestController<'a>,
    search_controller: SearchController<'a>,
    stats_controller: StatsController<'a>,
}

impl<'a> Router<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self {
            ingest_controller: IngestController::new(container),
            search_controller: SearchController::new(container),
            stats_controller: StatsController::new(container),
        }
    }

    pub async fn route(&self, command: Commands) -> Result<String> {
        match command {
            Commands::Ingest { path } => self.ingest_controller.ingest(path).await,
            Commands::Search {
                path,
                max_distance,
                limit,
            } => {
                self.search_controller
                    .search(path, max_distance, limit)
                    .await
            }
            Commands::Stats => self.stats_controller.stats().await,
            Commands::Serve { .. } => unreachable!("serve command is handled separately in main"),
        }
    }
}

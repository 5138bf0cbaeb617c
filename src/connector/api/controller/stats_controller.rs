use anyhow::Result;

use super::super::Container;

pub struct StatsController<'a> {
    container: &'a Container,
}

impl<'a> StatsController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    pub async fn stats(&self) -> Result<String> {
        let photos = self.container.photo_repo().count().await?;
        Ok(self.format_stats(photos))
    }

    fn format_stats(&self, photos: u64) -> String {
        let policy = self.container.policy();
        let model = self.container.embedding_config();
        let storage = if self.container.memory_storage() {
            "memory"
        } else {
            "duckdb"
        };

        format!(
            "FaceSearch Statistics\n=====================\nPhotos:       {}\nModel:        {} ({} dims)\nStorage:      {}\nMax Distance: {:.2}\nLimit:        {}\nUploads:      {}\nData Dir:     {}",
            photos,
            model.model_name(),
            model.dimensions(),
            storage,
            policy.max_distance(),
            policy.limit(),
            self.container.upload_store().root().display(),
            self.container.data_dir()
        )
    }
}

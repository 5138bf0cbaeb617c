use std::path::Path;

use anyhow::Result;

use crate::PhotoRecord;

use super::super::Container;

pub struct IngestController<'a> {
    container: &'a Container,
}

impl<'a> IngestController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    /// Ingests an image in place; the stored reference is its absolute path.
    pub async fn ingest(&self, path: String) -> Result<String> {
        let path = Path::new(&path);
        let reference = path
            .canonicalize()
            .unwrap_or_else(|_| path.to_path_buf())
            .to_string_lossy()
            .to_string();

        let use_case = self.container.ingest_use_case();
        let record = use_case.execute(path, &reference).await?;

        Ok(self.format_ingest_success(&record))
    }

    fn format_ingest_success(&self, record: &PhotoRecord) -> String {
        format!(
            "Stored photo #{}: {} ({} dimensions)",
            record.id(),
            record.file_path(),
            record.embedding().dimensions()
        )
    }
}

use std::path::Path;

use anyhow::Result;

use crate::SearchOutcome;

use super::super::Container;

pub struct SearchController<'a> {
    container: &'a Container,
}

impl<'a> SearchController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    pub async fn search(
        &self,
        path: String,
        max_distance: Option<f32>,
        limit: Option<usize>,
    ) -> Result<String> {
        let mut policy = self.container.policy();

        if let Some(max_distance) = max_distance {
            policy = policy.with_max_distance(max_distance);
        }

        if let Some(limit) = limit {
            policy = policy.with_limit(limit);
        }

        let use_case = self.container.search_use_case().with_policy(policy);
        let outcome = use_case.execute(Path::new(&path)).await?;

        Ok(self.format_search_results(&outcome))
    }

    fn format_search_results(&self, outcome: &SearchOutcome) -> String {
        let matches = match outcome {
            SearchOutcome::NoMatch => return "No matches found.".to_string(),
            SearchOutcome::Matched(matches) => matches,
        };

        let mut output = format!("Found {} matches:\n\n", matches.len());
        for (i, neighbor) in matches.iter().enumerate() {
            output.push_str(&format!("{}. {}\n", i + 1, neighbor.display_line()));
        }

        output
    }
}

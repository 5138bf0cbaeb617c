use serde::{Deserialize, Serialize};

use super::PhotoRecord;

/// A stored photo together with its cosine distance to the query.
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbor {
    record: PhotoRecord,
    distance: f32,
}

impl Neighbor {
    pub fn new(record: PhotoRecord, distance: f32) -> Self {
        Self { record, distance }
    }

    pub fn record(&self) -> &PhotoRecord {
        &self.record
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn display_line(&self) -> String {
        format!(
            "#{} {} (distance: {:.3})",
            self.record.id(),
            self.record.file_path(),
            self.distance
        )
    }
}

/// Orders neighbors by ascending distance, then ascending id.
pub fn rank_neighbors(neighbors: &mut [Neighbor]) {
    neighbors.sort_by(|a, b| {
        a.distance
            .total_cmp(&b.distance)
            .then_with(|| a.record.id().cmp(&b.record.id()))
    });
}

/// Terminal state of a search that obtained a usable embedding.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Matched(Vec<Neighbor>),
    NoMatch,
}

impl SearchOutcome {
    pub fn from_neighbors(neighbors: Vec<Neighbor>) -> Self {
        if neighbors.is_empty() {
            Self::NoMatch
        } else {
            Self::Matched(neighbors)
        }
    }

    pub fn matches(&self) -> &[Neighbor] {
        match self {
            Self::Matched(neighbors) => neighbors,
            Self::NoMatch => &[],
        }
    }
}

/// Distance cutoff and result cap applied to every search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchPolicy {
    max_distance: f32,
    limit: usize,
}

impl SearchPolicy {
    pub fn new(max_distance: f32, limit: usize) -> Self {
        Self {
            max_distance,
            // Ensure at least 1 result is requested
            limit: limit.max(1),
        }
    }

    pub fn with_max_distance(mut self, max_distance: f32) -> Self {
        self.max_distance = max_distance;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.max(1);
        self
    }

    pub fn max_distance(&self) -> f32 {
        self.max_distance
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn summary(&self) -> String {
        format!("max_distance={:.2}, limit={}", self.max_distance, self.limit)
    }
}

impl Default for SearchPolicy {
    fn default() -> Self {
        Self {
            max_distance: 0.5,
            limit: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Embedding;

    fn neighbor(id: i64, distance: f32) -> Neighbor {
        let record = PhotoRecord::reconstitute(id, format!("uploads/{}.jpg", id), Embedding::new(vec![]));
        Neighbor::new(record, distance)
    }

    #[test]
    fn test_rank_neighbors_orders_by_distance_then_id() {
        let mut neighbors = vec![neighbor(3, 0.4), neighbor(2, 0.1), neighbor(1, 0.4)];
        rank_neighbors(&mut neighbors);

        let ids: Vec<i64> = neighbors.iter().map(|n| n.record().id()).collect();
        assert_eq!(ids, vec![2, 1, 3]);
    }

    #[test]
    fn test_outcome_from_empty_is_no_match() {
        assert_eq!(SearchOutcome::from_neighbors(vec![]), SearchOutcome::NoMatch);

        let outcome = SearchOutcome::from_neighbors(vec![neighbor(1, 0.2)]);
        assert!(matches!(outcome, SearchOutcome::Matched(_)));
        assert_eq!(outcome.matches().len(), 1);
    }

    #[test]
    fn test_policy_defaults_and_builder() {
        let policy = SearchPolicy::default();
        assert_eq!(policy.max_distance(), 0.5);
        assert_eq!(policy.limit(), 10);

        let policy = policy.with_limit(0).with_max_distance(0.3);
        assert_eq!(policy.limit(), 1);
        assert_eq!(policy.max_distance(), 0.3);
        assert_eq!(policy.summary(), "max_distance=0.30, limit=1");
    }
}

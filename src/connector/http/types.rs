use serde::Serialize;

use crate::{DomainError, Neighbor, SearchOutcome};

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub id: i64,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub details: String,
}

impl From<&DomainError> for ErrorBody {
    fn from(err: &DomainError) -> Self {
        Self {
            error: err.kind().as_str(),
            details: err.details(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MatchBody {
    pub id: i64,
    pub file_path: String,
    pub distance: f32,
}

impl From<&Neighbor> for MatchBody {
    fn from(neighbor: &Neighbor) -> Self {
        Self {
            id: neighbor.record().id(),
            file_path: neighbor.record().file_path().to_string(),
            distance: neighbor.distance(),
        }
    }
}

/// Body of `/search`, tagged by `status`.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SearchBody {
    Matched { matches: Vec<MatchBody> },
    NoMatch { message: String },
    Error { error: &'static str, details: String },
}

impl SearchBody {
    pub fn from_error(err: &DomainError) -> Self {
        Self::Error {
            error: err.kind().as_str(),
            details: err.details(),
        }
    }
}

impl From<&SearchOutcome> for SearchBody {
    fn from(outcome: &SearchOutcome) -> Self {
        match outcome {
            SearchOutcome::Matched(neighbors) => Self::Matched {
                matches: neighbors.iter().map(MatchBody::from).collect(),
            },
            SearchOutcome::NoMatch => Self::NoMatch {
                message: "No matches found".to_string(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthBody {
    pub status: &'static str,
    pub photos: u64,
}

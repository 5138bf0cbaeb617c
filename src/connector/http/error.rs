use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use super::types::{ErrorBody, SearchBody};
use crate::{DomainError, ErrorKind};

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::ValidationFailure | ErrorKind::NoFaceDetected | ErrorKind::DetectionFailure => {
            StatusCode::BAD_REQUEST
        }
        ErrorKind::TransportFailure | ErrorKind::MalformedOutput => StatusCode::BAD_GATEWAY,
        ErrorKind::PersistenceFailure | ErrorKind::DataCorruption => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Failure of `/upload` and `/health`.
pub struct ApiError(pub DomainError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(self.0.kind());
        (status, Json(ErrorBody::from(&self.0))).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

/// Failure of `/search`, reported with `"status": "error"`.
pub struct SearchError(pub DomainError);

impl IntoResponse for SearchError {
    fn into_response(self) -> Response {
        let status = status_for(self.0.kind());
        (status, Json(SearchBody::from_error(&self.0))).into_response()
    }
}

impl From<DomainError> for SearchError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejections_are_client_errors() {
        assert_eq!(status_for(ErrorKind::NoFaceDetected), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(ErrorKind::DetectionFailure), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(ErrorKind::ValidationFailure), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_generator_and_storage_errors_are_server_errors() {
        assert_eq!(status_for(ErrorKind::TransportFailure), StatusCode::BAD_GATEWAY);
        assert_eq!(status_for(ErrorKind::MalformedOutput), StatusCode::BAD_GATEWAY);
        assert_eq!(
            status_for(ErrorKind::PersistenceFailure),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_for(ErrorKind::DataCorruption),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_api_error_status() {
        let response = ApiError(DomainError::NoFaceDetected).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = SearchError(DomainError::transport("timed out")).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}

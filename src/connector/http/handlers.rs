use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::Json;
use tracing::{debug, info};

use super::error::{ApiError, SearchError};
use super::types::{HealthBody, SearchBody, UploadResponse};
use crate::connector::api::Container;
use crate::DomainError;

/// Form field carrying the image.
const PHOTO_FIELD: &str = "photo";

struct UploadedPhoto {
    file_name: Option<String>,
    bytes: Vec<u8>,
}

async fn read_photo(mut multipart: Multipart) -> Result<UploadedPhoto, DomainError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| DomainError::validation(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some(PHOTO_FIELD) {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| DomainError::validation(format!("Failed to read upload: {}", e)))?;
        debug!("Received {} bytes ({:?})", bytes.len(), file_name);

        return Ok(UploadedPhoto {
            file_name,
            bytes: bytes.to_vec(),
        });
    }

    Err(DomainError::validation("No file uploaded"))
}

/// Stores an upload and ingests it. Rejected uploads are not kept.
pub async fn upload_handler(
    State(container): State<Arc<Container>>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let photo = read_photo(multipart).await?;
    let upload = container
        .upload_store()
        .save(photo.file_name.as_deref(), photo.bytes)
        .await?;

    // Identical uploads wait on `upload` until this one is kept or discarded.
    let use_case = container.ingest_use_case();
    let ingested = use_case.execute(upload.path(), &upload.reference()).await;
    match ingested {
        Ok(record) => {
            info!("Upload stored as photo #{}", record.id());
            Ok(Json(UploadResponse { id: record.id() }))
        }
        Err(e) => {
            container.upload_store().discard(upload).await;
            Err(e.into())
        }
    }
}

/// Searches with a temporary copy of the query image.
pub async fn search_handler(
    State(container): State<Arc<Container>>,
    multipart: Multipart,
) -> Result<Json<SearchBody>, SearchError> {
    let photo = read_photo(multipart).await?;

    // Removed when dropped, on every return path.
    let staged = container
        .upload_store()
        .stage_query(photo.file_name.as_deref(), photo.bytes)
        .await?;

    let use_case = container.search_use_case();
    let outcome = use_case.execute(staged.path()).await?;

    Ok(Json(SearchBody::from(&outcome)))
}

pub async fn health_handler(
    State(container): State<Arc<Container>>,
) -> Result<Json<HealthBody>, ApiError> {
    let photos = container.photo_repo().count().await?;
    Ok(Json(HealthBody {
        status: "ok",
        photos,
    }))
}

use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use chrono::Utc;
use serde::Deserialize;

use crate::application::ports::BlobStoreError;
use crate::domain::StorageKey;
use crate::infrastructure::storage::UrlVerificationError;
use crate::presentation::handlers::ApiError;
use crate::presentation::state::AppState;

#[derive(Deserialize)]
pub struct SignedQuery {
    pub expires: i64,
    pub nonce: String,
    pub signature: String,
}

/// Serves blobs behind locally signed URLs. Absent when the storage
/// provider signs its own URLs.
#[tracing::instrument(skip(state, query))]
pub async fn download_file_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<SignedQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let signer = state
        .local_signer
        .as_ref()
        .ok_or_else(|| ApiError::not_found("direct downloads are not enabled"))?;

    signer
        .verify(&key, query.expires, &query.nonce, &query.signature, Utc::now())
        .map_err(|e| match e {
            UrlVerificationError::Expired => {
                ApiError::new(axum::http::StatusCode::GONE, e.to_string())
            }
            UrlVerificationError::InvalidSignature => {
                ApiError::new(axum::http::StatusCode::FORBIDDEN, e.to_string())
            }
        })?;

    let data = state
        .blob_store
        .fetch(&StorageKey::from_raw(key.clone()))
        .await
        .map_err(|e| match e {
            BlobStoreError::NotFound(_) => ApiError::not_found(format!("file not found: {key}")),
            other => ApiError::new(
                axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                other.to_string(),
            ),
        })?;

    Ok(([(header::CONTENT_TYPE, "application/octet-stream")], data))
}

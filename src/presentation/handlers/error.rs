use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::ports::{BlobStoreError, EmbedderError, RepositoryError};
use crate::application::services::{
    EmbeddingServiceError, QueueError, StatusWriteError, SyncError,
};

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, error = %self.message, "Request failed");
        } else {
            tracing::debug!(status = %self.status, error = %self.message, "Request rejected");
        }
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

fn repository_status(e: &RepositoryError) -> StatusCode {
    match e {
        RepositoryError::NotFound(_) => StatusCode::NOT_FOUND,
        RepositoryError::ConstraintViolation(_) => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<SyncError> for ApiError {
    fn from(e: SyncError) -> Self {
        let status = match &e {
            SyncError::ProjectNotFound(_) | SyncError::DocumentNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            SyncError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            SyncError::Repository(r) => repository_status(r),
            SyncError::BlobStore(BlobStoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            SyncError::BlobStore(_) => StatusCode::INTERNAL_SERVER_ERROR,
            SyncError::Status(StatusWriteError::DocumentNotFound(_)) => StatusCode::NOT_FOUND,
            SyncError::Status(StatusWriteError::Transition(_)) => StatusCode::CONFLICT,
            SyncError::Status(StatusWriteError::Repository(r)) => repository_status(r),
            SyncError::Queue(QueueError::Full | QueueError::Closed) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            SyncError::Search(EmbeddingServiceError::EmptyContent) => StatusCode::BAD_REQUEST,
            SyncError::Search(EmbeddingServiceError::Embedding(EmbedderError::RateLimited)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            SyncError::Search(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, e.to_string())
    }
}

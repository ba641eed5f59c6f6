use axum::Json;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::application::services::{DocumentUpdate, NewDocument};
use crate::domain::{DocumentId, StorageKey};
use crate::presentation::handlers::ApiError;
use crate::presentation::handlers::projects::resolve;
use crate::presentation::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDocumentRequest {
    pub name: Option<String>,
    pub thumbnail_key: Option<String>,
    pub extracted_content: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReprocessResponse {
    pub document_id: String,
    pub message: String,
}

fn parse_document_id(raw: &str) -> Result<DocumentId, ApiError> {
    DocumentId::parse(raw).ok_or_else(|| ApiError::bad_request(format!("invalid document id: {raw}")))
}

pub async fn list_project_documents_handler(
    State(state): State<AppState>,
    Path(slug_or_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let project = resolve(&state, &slug_or_id).await?;
    let documents = state.facade.get_documents_by_project(project.id).await?;
    Ok(Json(documents))
}

/// Multipart fields: `file` (required), `name` and `thumbnailKey` (optional).
#[tracing::instrument(skip(state, multipart))]
pub async fn upload_document_handler(
    State(state): State<AppState>,
    Path(slug_or_id): Path<String>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let project = resolve(&state, &slug_or_id).await?;

    let mut file: Option<(String, String, Bytes)> = None;
    let mut name_override: Option<String> = None;
    let mut thumbnail_key: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Failed to read multipart: {e}")))?
    {
        match field.name().unwrap_or_default() {
            "file" => {
                let file_name = field.file_name().unwrap_or("unknown").to_string();
                let mime_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read file: {e}")))?;
                file = Some((file_name, mime_type, data));
            }
            "name" => {
                name_override = Some(field.text().await.map_err(|e| {
                    ApiError::bad_request(format!("Failed to read name: {e}"))
                })?);
            }
            "thumbnailKey" => {
                thumbnail_key = Some(field.text().await.map_err(|e| {
                    ApiError::bad_request(format!("Failed to read thumbnailKey: {e}"))
                })?);
            }
            other => tracing::debug!(field = %other, "Ignoring unknown multipart field"),
        }
    }

    let Some((file_name, mime_type, data)) = file else {
        tracing::warn!("Upload request with no file");
        return Err(ApiError::bad_request("No file uploaded"));
    };
    tracing::debug!(file_name = %file_name, mime_type = %mime_type, bytes = data.len(), "File data received");

    let document = state
        .facade
        .create_document(
            project.id,
            NewDocument {
                name: name_override
                    .filter(|n| !n.trim().is_empty())
                    .unwrap_or(file_name),
                mime_type,
                thumbnail_key: thumbnail_key
                    .filter(|k| !k.trim().is_empty())
                    .map(StorageKey::from_raw),
                content: Some(data),
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(document)))
}

pub async fn get_project_document_handler(
    State(state): State<AppState>,
    Path((slug_or_id, document_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let project = resolve(&state, &slug_or_id).await?;
    let document = state
        .facade
        .get_project_document(project.id, parse_document_id(&document_id)?)
        .await?;
    Ok(Json(document))
}

pub async fn list_documents_handler(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.facade.get_all_documents().await?))
}

pub async fn get_document_handler(
    State(state): State<AppState>,
    Path(document_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let document = state
        .facade
        .get_document(parse_document_id(&document_id)?)
        .await?;
    Ok(Json(document))
}

#[tracing::instrument(skip(state, request))]
pub async fn update_document_handler(
    State(state): State<AppState>,
    Path(document_id): Path<String>,
    Json(request): Json<UpdateDocumentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let document = state
        .facade
        .update_document(
            parse_document_id(&document_id)?,
            DocumentUpdate {
                name: request.name,
                thumbnail_key: request.thumbnail_key.map(StorageKey::from_raw),
                extracted_content: request.extracted_content,
            },
        )
        .await?;
    Ok(Json(document))
}

#[tracing::instrument(skip(state))]
pub async fn delete_document_handler(
    State(state): State<AppState>,
    Path(document_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .facade
        .delete_document(parse_document_id(&document_id)?)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn refresh_document_url_handler(
    State(state): State<AppState>,
    Path(document_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let document = state
        .facade
        .refresh_document_url(parse_document_id(&document_id)?)
        .await?;
    Ok(Json(document))
}

#[tracing::instrument(skip(state))]
pub async fn reprocess_document_handler(
    State(state): State<AppState>,
    Path(document_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let ticket = state
        .facade
        .reprocess_document(parse_document_id(&document_id)?)
        .await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(ReprocessResponse {
            document_id: ticket.document_id().to_string(),
            message: "Document reprocessing started".to_string(),
        }),
    ))
}

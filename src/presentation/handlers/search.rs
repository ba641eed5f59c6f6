use axum::Json;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::presentation::handlers::ApiError;
use crate::presentation::handlers::projects::resolve;
use crate::presentation::state::AppState;

const DEFAULT_TOP_K: usize = 5;
const MAX_TOP_K: usize = 100;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub query: String,
    pub top_k: Option<usize>,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub id: String,
    pub document_id: Option<String>,
    pub score: f32,
    pub distance: f32,
    pub content: Option<String>,
    pub metadata: Map<String, Value>,
}

#[tracing::instrument(skip(state, request))]
pub async fn search_handler(
    State(state): State<AppState>,
    Path(slug_or_id): Path<String>,
    Json(request): Json<SearchRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let project = resolve(&state, &slug_or_id).await?;
    let top_k = request.top_k.unwrap_or(DEFAULT_TOP_K).min(MAX_TOP_K);

    let hits = state
        .facade
        .semantic_search(project.id, &request.query, top_k)
        .await?;

    tracing::info!(results = hits.len(), "Search completed");
    Ok(Json(SearchResponse {
        results: hits
            .into_iter()
            .map(|hit| SearchResult {
                id: hit.vector_id,
                document_id: hit.document_id.map(|id| id.to_string()),
                score: hit.score,
                distance: hit.distance,
                content: hit.content,
                metadata: hit.metadata,
            })
            .collect(),
    }))
}

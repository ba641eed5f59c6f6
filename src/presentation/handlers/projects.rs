use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Deserialize;

use crate::application::services::{NewProject, ProjectUpdate};
use crate::domain::{CompanyId, Project};
use crate::presentation::handlers::ApiError;
use crate::presentation::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    pub company_id: String,
    pub name: String,
    pub description: Option<String>,
    pub slug: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProjectRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub slug: Option<String>,
}

pub(super) async fn resolve(state: &AppState, slug_or_id: &str) -> Result<Project, ApiError> {
    state
        .facade
        .resolve_project(slug_or_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("project not found: {slug_or_id}")))
}

pub async fn list_projects_handler(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let projects = state.facade.get_projects().await?;
    Ok(Json(projects))
}

#[tracing::instrument(skip(state, request), fields(name = %request.name))]
pub async fn create_project_handler(
    State(state): State<AppState>,
    Json(request): Json<CreateProjectRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if request.company_id.trim().is_empty() {
        return Err(ApiError::bad_request("companyId is required"));
    }

    let project = state
        .facade
        .create_project(NewProject {
            company_id: CompanyId::new(request.company_id),
            name: request.name,
            description: request.description,
            slug: request.slug,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn get_project_handler(
    State(state): State<AppState>,
    Path(slug_or_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(resolve(&state, &slug_or_id).await?))
}

#[tracing::instrument(skip(state, request))]
pub async fn update_project_handler(
    State(state): State<AppState>,
    Path(slug_or_id): Path<String>,
    Json(request): Json<UpdateProjectRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let project = resolve(&state, &slug_or_id).await?;
    let updated = state
        .facade
        .update_project(
            project.id,
            ProjectUpdate {
                name: request.name,
                description: request.description,
                slug: request.slug,
            },
        )
        .await?;
    Ok(Json(updated))
}

#[tracing::instrument(skip(state))]
pub async fn delete_project_handler(
    State(state): State<AppState>,
    Path(slug_or_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let project = resolve(&state, &slug_or_id).await?;
    state.facade.delete_project(project.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

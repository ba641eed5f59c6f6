use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::infrastructure::observability::request_id_middleware;
use crate::presentation::handlers::{
    create_project_handler, delete_document_handler, delete_project_handler,
    download_file_handler, get_document_handler, get_project_document_handler,
    get_project_handler, health_handler, list_documents_handler, list_project_documents_handler,
    list_projects_handler, refresh_document_url_handler, reprocess_document_handler,
    search_handler, update_document_handler, update_project_handler, upload_document_handler,
};
use crate::presentation::state::AppState;

const MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let api = Router::new()
        .route(
            "/projects",
            get(list_projects_handler).post(create_project_handler),
        )
        .route(
            "/projects/{slug_or_id}",
            get(get_project_handler)
                .patch(update_project_handler)
                .delete(delete_project_handler),
        )
        .route(
            "/projects/{slug_or_id}/documents",
            get(list_project_documents_handler).post(upload_document_handler),
        )
        .route(
            "/projects/{slug_or_id}/documents/{document_id}",
            get(get_project_document_handler),
        )
        .route("/projects/{slug_or_id}/search", post(search_handler))
        .route("/documents", get(list_documents_handler))
        .route(
            "/documents/{document_id}",
            get(get_document_handler)
                .patch(update_document_handler)
                .delete(delete_document_handler),
        )
        .route(
            "/documents/{document_id}/refresh-url",
            post(refresh_document_url_handler),
        )
        .route(
            "/documents/{document_id}/reprocess",
            post(reprocess_document_handler),
        );

    Router::new()
        .route("/health", get(health_handler))
        .route("/files/{*key}", get(download_file_handler))
        .nest("/api/v1", api)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(trace_layer)
        .layer(cors)
        .with_state(state)
}

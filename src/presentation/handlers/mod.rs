mod documents;
mod error;
mod files;
mod health;
mod projects;
mod search;

pub use documents::{
    delete_document_handler, get_document_handler, get_project_document_handler,
    list_documents_handler, list_project_documents_handler, refresh_document_url_handler,
    reprocess_document_handler, update_document_handler, upload_document_handler,
};
pub use error::{ApiError, ErrorResponse};
pub use files::download_file_handler;
pub use health::health_handler;
pub use projects::{
    create_project_handler, delete_project_handler, get_project_handler, list_projects_handler,
    update_project_handler,
};
pub use search::search_handler;

use async_trait::async_trait;

use super::RepositoryError;
use crate::domain::{Document, DocumentId, DocumentStatus, Project, ProjectId, SignedUrl};

/// Authoritative store for projects and documents.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    async fn insert_project(&self, project: &Project) -> Result<(), RepositoryError>;

    async fn update_project(&self, project: &Project) -> Result<(), RepositoryError>;

    /// Removes the project and every document belonging to it, returning the
    /// removed documents. `None` when the project did not exist.
    async fn delete_project(
        &self,
        id: ProjectId,
    ) -> Result<Option<(Project, Vec<Document>)>, RepositoryError>;

    async fn get_project(&self, id: ProjectId) -> Result<Option<Project>, RepositoryError>;

    async fn list_projects(&self) -> Result<Vec<Project>, RepositoryError>;

    async fn insert_document(&self, document: &Document) -> Result<(), RepositoryError>;

    async fn update_document(&self, document: &Document) -> Result<(), RepositoryError>;

    async fn update_document_status(
        &self,
        id: DocumentId,
        status: DocumentStatus,
        extracted_content: Option<&str>,
    ) -> Result<(), RepositoryError>;

    async fn delete_document(&self, id: DocumentId) -> Result<Option<Document>, RepositoryError>;

    async fn get_document(&self, id: DocumentId) -> Result<Option<Document>, RepositoryError>;

    async fn list_documents_by_project(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<Document>, RepositoryError>;

    async fn list_documents(&self) -> Result<Vec<Document>, RepositoryError>;

    /// Cache-warm only; readers never trust the stored value.
    async fn store_signed_url(
        &self,
        id: DocumentId,
        signed_url: &SignedUrl,
    ) -> Result<(), RepositoryError>;
}

use async_trait::async_trait;

use crate::domain::{Document, DocumentId, Project, ProjectId};

/// Legacy blob-backed copy of project and document records. Derived from the
/// metadata store and never read on the primary path.
#[async_trait]
pub trait MetadataMirror: Send + Sync {
    async fn put_project(&self, project: &Project) -> Result<(), MirrorError>;

    async fn delete_project(&self, id: ProjectId) -> Result<(), MirrorError>;

    async fn get_project(&self, id: ProjectId) -> Result<Option<Project>, MirrorError>;

    async fn put_document(&self, document: &Document) -> Result<(), MirrorError>;

    async fn delete_document(
        &self,
        project_id: ProjectId,
        id: DocumentId,
    ) -> Result<(), MirrorError>;

    async fn get_document(
        &self,
        project_id: ProjectId,
        id: DocumentId,
    ) -> Result<Option<Document>, MirrorError>;
}

#[derive(Debug, thiserror::Error)]
pub enum MirrorError {
    #[error("mirror write failed: {0}")]
    WriteFailed(String),
    #[error("mirror read failed: {0}")]
    ReadFailed(String),
    #[error("mirror delete failed: {0}")]
    DeleteFailed(String),
    #[error("mirror snapshot malformed: {0}")]
    Serialization(#[from] serde_json::Error),
}

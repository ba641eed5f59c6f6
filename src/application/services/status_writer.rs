use std::sync::Arc;

use crate::application::ports::{MetadataStore, RepositoryError};
use crate::application::services::MirrorSync;
use crate::domain::{Document, DocumentId, DocumentStatus, DocumentStatusError};

/// Validated status writes against the authoritative store, followed by a
/// mirror refresh.
#[derive(Clone)]
pub struct StatusWriter {
    metadata_store: Arc<dyn MetadataStore>,
    mirror: MirrorSync,
}

impl StatusWriter {
    pub fn new(metadata_store: Arc<dyn MetadataStore>, mirror: MirrorSync) -> Self {
        Self {
            metadata_store,
            mirror,
        }
    }

    #[tracing::instrument(skip(self, extracted_content), fields(document_id = %id, status = %next))]
    pub async fn transition(
        &self,
        id: DocumentId,
        next: DocumentStatus,
        extracted_content: Option<&str>,
    ) -> Result<Document, StatusWriteError> {
        let mut document = self
            .metadata_store
            .get_document(id)
            .await?
            .ok_or(StatusWriteError::DocumentNotFound(id))?;

        document.transition_to(next)?;
        self.persist(document, extracted_content).await
    }

    /// Explicit re-entry into `processing` from any state.
    #[tracing::instrument(skip(self), fields(document_id = %id))]
    pub async fn reprocess(&self, id: DocumentId) -> Result<Document, StatusWriteError> {
        let mut document = self
            .metadata_store
            .get_document(id)
            .await?
            .ok_or(StatusWriteError::DocumentNotFound(id))?;

        document.begin_reprocessing();
        self.persist(document, None).await
    }

    async fn persist(
        &self,
        mut document: Document,
        extracted_content: Option<&str>,
    ) -> Result<Document, StatusWriteError> {
        self.metadata_store
            .update_document_status(document.id, document.status, extracted_content)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound(_) => StatusWriteError::DocumentNotFound(document.id),
                other => StatusWriteError::Repository(other),
            })?;

        if let Some(content) = extracted_content {
            document.extracted_content = Some(content.to_string());
        }

        tracing::debug!(status = %document.status, "Document status transition");
        self.mirror.document_saved(&document);
        Ok(document)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StatusWriteError {
    #[error("document not found: {0}")]
    DocumentNotFound(DocumentId),
    #[error("{0}")]
    Transition(#[from] DocumentStatusError),
    #[error("repository: {0}")]
    Repository(#[from] RepositoryError),
}

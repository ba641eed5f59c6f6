use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};

use crate::application::ports::{BlobStore, BlobStoreError, RepositoryError};
use crate::application::services::{
    EmbeddingService, EmbeddingServiceError, StatusWriteError, StatusWriter,
    TextExtractionService,
};
use crate::domain::{
    CompanyId, DocumentId, DocumentStatus, DocumentStatusError, MediaType, ProjectId, StorageKey,
};

#[derive(Debug, Clone)]
pub struct JobMetadata {
    pub file_name: String,
    pub mime_type: String,
}

/// What put a job on the queue, which decides how it enters `processing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobTrigger {
    /// Regular `uploaded -> processing` transition.
    Upload,
    /// Re-enters `processing` from any state, so a reprocess requested while
    /// an earlier job was still running is not lost when that job finishes.
    Reprocess,
}

/// One unit of background work: extract, embed, index, update status.
#[derive(Debug, Clone)]
pub struct DocumentJob {
    pub company_id: CompanyId,
    pub project_id: ProjectId,
    pub document_id: DocumentId,
    pub storage_key: StorageKey,
    pub metadata: JobMetadata,
    pub trigger: JobTrigger,
}

pub struct DocumentProcessor {
    blob_store: Arc<dyn BlobStore>,
    extraction: TextExtractionService,
    embeddings: Arc<EmbeddingService>,
    status: StatusWriter,
    job_timeout: Option<Duration>,
}

impl DocumentProcessor {
    pub fn new(
        blob_store: Arc<dyn BlobStore>,
        extraction: TextExtractionService,
        embeddings: Arc<EmbeddingService>,
        status: StatusWriter,
        job_timeout: Option<Duration>,
    ) -> Self {
        Self {
            blob_store,
            extraction,
            embeddings,
            status,
            job_timeout,
        }
    }

    pub async fn process(&self, job: &DocumentJob) -> Result<(), ProcessingError> {
        let doc_id = job.document_id;

        match job.trigger {
            JobTrigger::Upload => {
                self.status
                    .transition(doc_id, DocumentStatus::Processing, None)
                    .await?;
            }
            JobTrigger::Reprocess => {
                self.status.reprocess(doc_id).await?;
            }
        }

        let outcome = match self.job_timeout {
            Some(limit) => tokio::time::timeout(limit, self.extract_and_index(job))
                .await
                .unwrap_or(Err(ProcessingError::TimedOut(limit))),
            None => self.extract_and_index(job).await,
        };

        match outcome {
            Ok(content) => match self
                .status
                .transition(doc_id, DocumentStatus::Processed, Some(&content))
                .await
            {
                Ok(_) => {
                    tracing::info!(document_id = %doc_id, "Document processing completed");
                    Ok(())
                }
                // Deleted while the job ran: the vector just written would
                // outlive the record.
                Err(StatusWriteError::DocumentNotFound(id)) => {
                    tracing::warn!(
                        document_id = %id,
                        "Document deleted during processing, removing its embedding"
                    );
                    if let Err(e) = self
                        .embeddings
                        .delete_document_embedding(&job.project_id, &id)
                        .await
                    {
                        tracing::warn!(
                            error = %e,
                            document_id = %id,
                            "Failed to remove orphaned embedding"
                        );
                    }
                    Err(ProcessingError::DocumentNotFound(id))
                }
                // Store outage: the embedding stays and the document can be
                // reprocessed.
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        document_id = %doc_id,
                        "Failed to mark document processed, embedding retained"
                    );
                    tracing::info!(document_id = %doc_id, "Document processing completed");
                    Ok(())
                }
            },
            Err(e) => {
                if let Err(status_err) = self
                    .status
                    .transition(doc_id, DocumentStatus::Failed, None)
                    .await
                {
                    tracing::warn!(
                        error = %status_err,
                        document_id = %doc_id,
                        "Failed to mark document failed"
                    );
                }
                Err(e)
            }
        }
    }

    async fn extract_and_index(&self, job: &DocumentJob) -> Result<String, ProcessingError> {
        let data = self.blob_store.fetch(&job.storage_key).await?;

        let media_type = MediaType::detect(&job.metadata.mime_type, &job.metadata.file_name);
        tracing::debug!(media_type = ?media_type, bytes = data.len(), "Starting text extraction");

        let text = self.extraction.extract_text(&data, media_type).await;
        if text.trim().is_empty() {
            return Err(ProcessingError::EmptyContent(job.document_id));
        }

        let mut metadata = Map::new();
        metadata.insert(
            "file_name".to_string(),
            Value::String(job.metadata.file_name.clone()),
        );
        metadata.insert(
            "mime_type".to_string(),
            Value::String(job.metadata.mime_type.clone()),
        );
        metadata.insert(
            "company_id".to_string(),
            Value::String(job.company_id.to_string()),
        );
        metadata.insert(
            "storage_key".to_string(),
            Value::String(job.storage_key.to_string()),
        );

        self.embeddings
            .upsert_document_embedding(&job.project_id, &job.document_id, &text, metadata)
            .await?;

        Ok(text)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    #[error("document not found: {0}")]
    DocumentNotFound(DocumentId),
    #[error("no text content extracted from document {0}")]
    EmptyContent(DocumentId),
    #[error("blob store: {0}")]
    BlobStore(#[from] BlobStoreError),
    #[error("embedding: {0}")]
    Embedding(#[from] EmbeddingServiceError),
    #[error("repository: {0}")]
    Repository(RepositoryError),
    #[error("status: {0}")]
    Status(DocumentStatusError),
    #[error("job timed out after {0:?}")]
    TimedOut(Duration),
    #[error("job dropped before completion")]
    Abandoned,
}

impl From<StatusWriteError> for ProcessingError {
    fn from(e: StatusWriteError) -> Self {
        match e {
            StatusWriteError::DocumentNotFound(id) => Self::DocumentNotFound(id),
            StatusWriteError::Transition(t) => Self::Status(t),
            StatusWriteError::Repository(r) => Self::Repository(r),
        }
    }
}

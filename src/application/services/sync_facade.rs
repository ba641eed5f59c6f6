use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::Utc;

use crate::application::ports::{BlobStore, BlobStoreError, MetadataStore, RepositoryError};
use crate::application::services::{
    BackgroundQueue, EmbeddingService, EmbeddingServiceError, JobMetadata, JobTicket, JobTrigger,
    MirrorSync, QueueError, SearchHit, StatusWriteError, StatusWriter, spawn_best_effort,
};
use crate::domain::{
    CompanyId, Document, DocumentId, Project, ProjectId, SignedUrl, StorageKey, slugify,
};

#[derive(Debug, Clone)]
pub struct NewProject {
    pub company_id: CompanyId,
    pub name: String,
    pub description: Option<String>,
    pub slug: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ProjectUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub slug: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewDocument {
    pub name: String,
    pub mime_type: String,
    pub thumbnail_key: Option<StorageKey>,
    pub content: Option<Bytes>,
}

/// Status is deliberately absent; it only moves through the processing pipeline.
#[derive(Debug, Clone, Default)]
pub struct DocumentUpdate {
    pub name: Option<String>,
    pub thumbnail_key: Option<StorageKey>,
    pub extracted_content: Option<String>,
}

/// Unified entry point for project and document lifecycle.
///
/// The metadata store is authoritative: its failures fail the call. Mirror
/// writes, blob cleanup, vector cleanup and signed-URL cache warming run after
/// the authoritative step and never surface their errors.
#[derive(Clone)]
pub struct SyncFacade {
    metadata_store: Arc<dyn MetadataStore>,
    blob_store: Arc<dyn BlobStore>,
    mirror: MirrorSync,
    status: StatusWriter,
    embeddings: Arc<EmbeddingService>,
    queue: BackgroundQueue,
    signed_url_ttl: Duration,
}

impl SyncFacade {
    pub fn new(
        metadata_store: Arc<dyn MetadataStore>,
        blob_store: Arc<dyn BlobStore>,
        mirror: MirrorSync,
        embeddings: Arc<EmbeddingService>,
        queue: BackgroundQueue,
        signed_url_ttl: Duration,
    ) -> Self {
        let status = StatusWriter::new(Arc::clone(&metadata_store), mirror.clone());
        Self {
            metadata_store,
            blob_store,
            mirror,
            status,
            embeddings,
            queue,
            signed_url_ttl,
        }
    }

    // ---- projects ----

    #[tracing::instrument(skip(self, input), fields(company_id = %input.company_id, name = %input.name))]
    pub async fn create_project(&self, input: NewProject) -> Result<Project, SyncError> {
        if input.name.trim().is_empty() {
            return Err(SyncError::InvalidInput("project name is required".into()));
        }

        let project = Project::new(input.company_id, input.name, input.description, input.slug);
        self.metadata_store.insert_project(&project).await?;
        self.mirror.project_saved(&project);

        tracing::info!(project_id = %project.id, slug = %project.slug, "Project created");
        Ok(project)
    }

    #[tracing::instrument(skip(self, update), fields(project_id = %id))]
    pub async fn update_project(
        &self,
        id: ProjectId,
        update: ProjectUpdate,
    ) -> Result<Project, SyncError> {
        let mut project = self
            .metadata_store
            .get_project(id)
            .await?
            .ok_or(SyncError::ProjectNotFound(id))?;

        if let Some(name) = update.name {
            if name.trim().is_empty() {
                return Err(SyncError::InvalidInput("project name is required".into()));
            }
            if update.slug.is_none() && name != project.name {
                project.slug = slugify(&name);
            }
            project.name = name;
        }
        if let Some(slug) = update.slug {
            let slug = slugify(&slug);
            if !slug.is_empty() {
                project.slug = slug;
            }
        }
        if update.description.is_some() {
            project.description = update.description;
        }
        project.updated_at = Utc::now();

        self.metadata_store.update_project(&project).await?;
        self.mirror.project_saved(&project);
        Ok(project)
    }

    /// Removes the project and its documents from the authoritative store,
    /// then cleans up every secondary artifact in the background.
    #[tracing::instrument(skip(self), fields(project_id = %id))]
    pub async fn delete_project(&self, id: ProjectId) -> Result<(), SyncError> {
        let (project, documents) = self
            .metadata_store
            .delete_project(id)
            .await?
            .ok_or(SyncError::ProjectNotFound(id))?;

        self.mirror.project_deleted(project.id);
        for document in &documents {
            self.cleanup_document_artifacts(document, false);
        }

        let embeddings = Arc::clone(&self.embeddings);
        spawn_best_effort("vector_delete_namespace", async move {
            embeddings.delete_project_namespace(&id).await
        });

        tracing::info!(documents = documents.len(), "Project deleted");
        Ok(())
    }

    pub async fn get_projects(&self) -> Result<Vec<Project>, SyncError> {
        Ok(self.metadata_store.list_projects().await?)
    }

    pub async fn get_project(&self, id: ProjectId) -> Result<Project, SyncError> {
        self.metadata_store
            .get_project(id)
            .await?
            .ok_or(SyncError::ProjectNotFound(id))
    }

    /// Id first, then stored slug, then the slug of each project's current
    /// name. The last step catches projects renamed without a slug refresh.
    #[tracing::instrument(skip(self))]
    pub async fn resolve_project(&self, slug_or_id: &str) -> Result<Option<Project>, SyncError> {
        if let Some(id) = ProjectId::parse(slug_or_id) {
            if let Some(project) = self.metadata_store.get_project(id).await? {
                return Ok(Some(project));
            }
        }

        let projects = self.metadata_store.list_projects().await?;
        if let Some(project) = projects.iter().find(|p| p.slug == slug_or_id) {
            return Ok(Some(project.clone()));
        }

        let candidate = slugify(slug_or_id);
        let resolved = projects.into_iter().find(|p| p.matches_slug(&candidate));
        if resolved.is_none() {
            tracing::debug!("No project matched slug or id");
        }
        Ok(resolved)
    }

    // ---- documents ----

    /// Stores the bytes, records the document as `uploaded`, and queues it for
    /// processing when content was supplied.
    #[tracing::instrument(skip(self, input), fields(project_id = %project_id, name = %input.name))]
    pub async fn create_document(
        &self,
        project_id: ProjectId,
        input: NewDocument,
    ) -> Result<Document, SyncError> {
        if input.name.trim().is_empty() {
            return Err(SyncError::InvalidInput("document name is required".into()));
        }

        let project = self
            .metadata_store
            .get_project(project_id)
            .await?
            .ok_or(SyncError::ProjectNotFound(project_id))?;

        let size = input.content.as_ref().map_or(0, |b| b.len() as u64);
        let mut document = Document::new(project_id, input.name, input.mime_type, size);
        document.thumbnail_key = input.thumbnail_key;

        if let Some(content) = input.content.clone() {
            let key = StorageKey::for_upload(
                &project.company_id,
                &project_id,
                &document.id,
                Utc::now().timestamp_millis(),
                &document.name,
            );
            document.size = self.blob_store.put(&key, content).await?;
            document.storage_key = Some(key);
        }

        if let Err(e) = self.metadata_store.insert_document(&document).await {
            if let Some(key) = document.storage_key.clone() {
                let blob_store = Arc::clone(&self.blob_store);
                spawn_best_effort("blob_delete_orphan", async move {
                    blob_store.delete(&key).await
                });
            }
            return Err(e.into());
        }

        self.mirror.document_saved(&document);
        tracing::info!(document_id = %document.id, size = document.size, "Document created");

        // The document is already durable; a refused enqueue leaves it
        // `uploaded` for a later reprocess instead of failing the upload.
        if input.content.is_some() {
            if let Err(e) =
                self.enqueue_processing(&project.company_id, &document, JobTrigger::Upload)
            {
                tracing::error!(error = %e, document_id = %document.id, "Failed to enqueue document processing");
            }
        }

        Ok(self.with_fresh_url(document).await)
    }

    #[tracing::instrument(skip(self, update), fields(document_id = %id))]
    pub async fn update_document(
        &self,
        id: DocumentId,
        update: DocumentUpdate,
    ) -> Result<Document, SyncError> {
        let mut document = self
            .metadata_store
            .get_document(id)
            .await?
            .ok_or(SyncError::DocumentNotFound(id))?;

        if let Some(name) = update.name {
            if name.trim().is_empty() {
                return Err(SyncError::InvalidInput("document name is required".into()));
            }
            document.name = name;
        }
        if update.thumbnail_key.is_some() {
            document.thumbnail_key = update.thumbnail_key;
        }
        if update.extracted_content.is_some() {
            document.extracted_content = update.extracted_content;
        }
        document.updated_at = Utc::now();

        self.metadata_store.update_document(&document).await?;
        self.mirror.document_saved(&document);
        Ok(self.with_fresh_url(document).await)
    }

    /// Authoritative delete, then four independent best-effort cleanups.
    #[tracing::instrument(skip(self), fields(document_id = %id))]
    pub async fn delete_document(&self, id: DocumentId) -> Result<(), SyncError> {
        let document = self
            .metadata_store
            .delete_document(id)
            .await?
            .ok_or(SyncError::DocumentNotFound(id))?;

        self.cleanup_document_artifacts(&document, true);
        tracing::info!(project_id = %document.project_id, "Document deleted");
        Ok(())
    }

    pub async fn get_document(&self, id: DocumentId) -> Result<Document, SyncError> {
        let document = self
            .metadata_store
            .get_document(id)
            .await?
            .ok_or(SyncError::DocumentNotFound(id))?;
        Ok(self.with_fresh_url(document).await)
    }

    /// Lookup scoped by project. A mismatched association is logged, not
    /// rejected.
    pub async fn get_project_document(
        &self,
        project_id: ProjectId,
        id: DocumentId,
    ) -> Result<Document, SyncError> {
        let document = self.get_document(id).await?;
        if document.project_id != project_id {
            tracing::warn!(
                document_id = %id,
                requested_project_id = %project_id,
                actual_project_id = %document.project_id,
                "Document does not belong to requested project"
            );
        }
        Ok(document)
    }

    pub async fn get_documents_by_project(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<Document>, SyncError> {
        let documents = self
            .metadata_store
            .list_documents_by_project(project_id)
            .await?;
        Ok(self.with_fresh_urls(documents).await)
    }

    pub async fn get_all_documents(&self) -> Result<Vec<Document>, SyncError> {
        let documents = self.metadata_store.list_documents().await?;
        Ok(self.with_fresh_urls(documents).await)
    }

    /// Explicit refresh; unlike the read paths, signing failures surface.
    #[tracing::instrument(skip(self), fields(document_id = %id))]
    pub async fn refresh_document_url(&self, id: DocumentId) -> Result<Document, SyncError> {
        let mut document = self
            .metadata_store
            .get_document(id)
            .await?
            .ok_or(SyncError::DocumentNotFound(id))?;

        let key = document
            .storage_key
            .clone()
            .ok_or_else(|| SyncError::InvalidInput("document has no stored content".into()))?;

        let signed = self.blob_store.signed_url(&key, self.signed_url_ttl).await?;
        self.metadata_store.store_signed_url(id, &signed).await?;
        document.signed_url = Some(signed);
        Ok(document)
    }

    /// Manual re-entry into `processing`, the only exit from a terminal state.
    #[tracing::instrument(skip(self), fields(document_id = %id))]
    pub async fn reprocess_document(&self, id: DocumentId) -> Result<JobTicket, SyncError> {
        let existing = self
            .metadata_store
            .get_document(id)
            .await?
            .ok_or(SyncError::DocumentNotFound(id))?;
        if existing.storage_key.is_none() {
            return Err(SyncError::InvalidInput("document has no stored content".into()));
        }
        let project = self
            .metadata_store
            .get_project(existing.project_id)
            .await?
            .ok_or(SyncError::ProjectNotFound(existing.project_id))?;

        let document = self.status.reprocess(id).await?;
        self.enqueue_processing(&project.company_id, &document, JobTrigger::Reprocess)
    }

    pub async fn semantic_search(
        &self,
        project_id: ProjectId,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<SearchHit>, SyncError> {
        Ok(self
            .embeddings
            .semantic_search(&project_id, query, top_k)
            .await?)
    }

    fn enqueue_processing(
        &self,
        company_id: &CompanyId,
        document: &Document,
        trigger: JobTrigger,
    ) -> Result<JobTicket, SyncError> {
        let key = document
            .storage_key
            .clone()
            .ok_or_else(|| SyncError::InvalidInput("document has no stored content".into()))?;
        let metadata = JobMetadata {
            file_name: document.name.clone(),
            mime_type: document.mime_type.clone(),
        };

        let ticket = match trigger {
            JobTrigger::Upload => self.queue.enqueue(
                company_id.clone(),
                document.project_id,
                document.id,
                key,
                metadata,
            ),
            JobTrigger::Reprocess => self.queue.enqueue_reprocess(
                company_id.clone(),
                document.project_id,
                document.id,
                key,
                metadata,
            ),
        };
        Ok(ticket?)
    }

    fn cleanup_document_artifacts(&self, document: &Document, include_vector: bool) {
        self.mirror.document_deleted(document.project_id, document.id);

        if let Some(key) = document.storage_key.clone() {
            let blob_store = Arc::clone(&self.blob_store);
            spawn_best_effort("blob_delete", async move { blob_store.delete(&key).await });
        }

        if let Some(key) = document.thumbnail_key.clone() {
            let blob_store = Arc::clone(&self.blob_store);
            spawn_best_effort("thumbnail_delete", async move {
                blob_store.delete(&key).await
            });
        }

        // Project deletion drops the whole namespace instead.
        if include_vector {
            let embeddings = Arc::clone(&self.embeddings);
            let project_id = document.project_id;
            let document_id = document.id;
            spawn_best_effort("vector_delete", async move {
                embeddings
                    .delete_document_embedding(&project_id, &document_id)
                    .await
            });
        }
    }

    /// Never trusts a stored URL. A signing failure degrades the read to no
    /// URL rather than failing it.
    async fn with_fresh_url(&self, mut document: Document) -> Document {
        document.signed_url = None;
        let Some(key) = document.storage_key.clone() else {
            return document;
        };

        match self.blob_store.signed_url(&key, self.signed_url_ttl).await {
            Ok(signed) => {
                self.warm_signed_url_cache(document.id, signed.clone());
                document.signed_url = Some(signed);
            }
            Err(e) => {
                tracing::warn!(error = %e, document_id = %document.id, "Signed URL regeneration failed");
            }
        }
        document
    }

    async fn with_fresh_urls(&self, documents: Vec<Document>) -> Vec<Document> {
        futures::future::join_all(documents.into_iter().map(|d| self.with_fresh_url(d))).await
    }

    fn warm_signed_url_cache(&self, id: DocumentId, signed: SignedUrl) {
        let store = Arc::clone(&self.metadata_store);
        spawn_best_effort("signed_url_cache_warm", async move {
            store.store_signed_url(id, &signed).await
        });
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("project not found: {0}")]
    ProjectNotFound(ProjectId),
    #[error("document not found: {0}")]
    DocumentNotFound(DocumentId),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("repository: {0}")]
    Repository(#[from] RepositoryError),
    #[error("blob store: {0}")]
    BlobStore(#[from] BlobStoreError),
    #[error("status: {0}")]
    Status(#[from] StatusWriteError),
    #[error("queue: {0}")]
    Queue(#[from] QueueError),
    #[error("search: {0}")]
    Search(#[from] EmbeddingServiceError),
}

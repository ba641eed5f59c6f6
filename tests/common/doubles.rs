use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::Mutex;

use scopeiq::application::ports::{
    BlobStore, BlobStoreError, Embedder, EmbedderError, MetadataMirror, MetadataStore,
    MirrorError, RepositoryError, VectorIndex, VectorIndexError, VectorMatch,
};
use scopeiq::domain::{
    Document, DocumentId, DocumentStatus, Embedding, EmbeddingRecord, Namespace, Project,
    ProjectId, SignedUrl, StorageKey, VectorId,
};
use scopeiq::infrastructure::embedding::HashingEmbedder;
use scopeiq::infrastructure::persistence::{InMemoryMetadataStore, InMemoryVectorIndex};

pub struct FailingMirror;

#[async_trait]
impl MetadataMirror for FailingMirror {
    async fn put_project(&self, _: &Project) -> Result<(), MirrorError> {
        Err(MirrorError::WriteFailed("mirror offline".into()))
    }

    async fn delete_project(&self, _: ProjectId) -> Result<(), MirrorError> {
        Err(MirrorError::DeleteFailed("mirror offline".into()))
    }

    async fn get_project(&self, _: ProjectId) -> Result<Option<Project>, MirrorError> {
        Err(MirrorError::ReadFailed("mirror offline".into()))
    }

    async fn put_document(&self, _: &Document) -> Result<(), MirrorError> {
        Err(MirrorError::WriteFailed("mirror offline".into()))
    }

    async fn delete_document(&self, _: ProjectId, _: DocumentId) -> Result<(), MirrorError> {
        Err(MirrorError::DeleteFailed("mirror offline".into()))
    }

    async fn get_document(
        &self,
        _: ProjectId,
        _: DocumentId,
    ) -> Result<Option<Document>, MirrorError> {
        Err(MirrorError::ReadFailed("mirror offline".into()))
    }
}

/// Wraps a real blob store and fails selected operations on demand.
pub struct FaultyBlobStore {
    inner: Arc<dyn BlobStore>,
    pub fail_delete: AtomicBool,
    pub fail_sign: AtomicBool,
    pub delete_attempts: Mutex<Vec<StorageKey>>,
}

impl FaultyBlobStore {
    pub fn wrapping(inner: Arc<dyn BlobStore>) -> Self {
        Self {
            inner,
            fail_delete: AtomicBool::new(false),
            fail_sign: AtomicBool::new(false),
            delete_attempts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl BlobStore for FaultyBlobStore {
    async fn put(&self, key: &StorageKey, data: Bytes) -> Result<u64, BlobStoreError> {
        self.inner.put(key, data).await
    }

    async fn fetch(&self, key: &StorageKey) -> Result<Bytes, BlobStoreError> {
        self.inner.fetch(key).await
    }

    async fn delete(&self, key: &StorageKey) -> Result<(), BlobStoreError> {
        self.delete_attempts.lock().await.push(key.clone());
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(BlobStoreError::DeleteFailed("storage offline".into()));
        }
        self.inner.delete(key).await
    }

    async fn signed_url(
        &self,
        key: &StorageKey,
        ttl: Duration,
    ) -> Result<SignedUrl, BlobStoreError> {
        if self.fail_sign.load(Ordering::SeqCst) {
            return Err(BlobStoreError::SigningFailed("credentials expired".into()));
        }
        self.inner.signed_url(key, ttl).await
    }
}

/// In-memory metadata store with switchable write failures.
#[derive(Default)]
pub struct FaultyMetadataStore {
    inner: InMemoryMetadataStore,
    pub fail_insert_document: AtomicBool,
    pub fail_processed_write: AtomicBool,
    pub cached_urls: AtomicUsize,
}

impl FaultyMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MetadataStore for FaultyMetadataStore {
    async fn insert_project(&self, project: &Project) -> Result<(), RepositoryError> {
        self.inner.insert_project(project).await
    }

    async fn update_project(&self, project: &Project) -> Result<(), RepositoryError> {
        self.inner.update_project(project).await
    }

    async fn delete_project(
        &self,
        id: ProjectId,
    ) -> Result<Option<(Project, Vec<Document>)>, RepositoryError> {
        self.inner.delete_project(id).await
    }

    async fn get_project(&self, id: ProjectId) -> Result<Option<Project>, RepositoryError> {
        self.inner.get_project(id).await
    }

    async fn list_projects(&self) -> Result<Vec<Project>, RepositoryError> {
        self.inner.list_projects().await
    }

    async fn insert_document(&self, document: &Document) -> Result<(), RepositoryError> {
        if self.fail_insert_document.load(Ordering::SeqCst) {
            return Err(RepositoryError::ConnectionFailed("database unavailable".into()));
        }
        self.inner.insert_document(document).await
    }

    async fn update_document(&self, document: &Document) -> Result<(), RepositoryError> {
        self.inner.update_document(document).await
    }

    async fn update_document_status(
        &self,
        id: DocumentId,
        status: DocumentStatus,
        extracted_content: Option<&str>,
    ) -> Result<(), RepositoryError> {
        if status == DocumentStatus::Processed && self.fail_processed_write.load(Ordering::SeqCst)
        {
            return Err(RepositoryError::QueryFailed("write timeout".into()));
        }
        self.inner
            .update_document_status(id, status, extracted_content)
            .await
    }

    async fn delete_document(&self, id: DocumentId) -> Result<Option<Document>, RepositoryError> {
        self.inner.delete_document(id).await
    }

    async fn get_document(&self, id: DocumentId) -> Result<Option<Document>, RepositoryError> {
        self.inner.get_document(id).await
    }

    async fn list_documents_by_project(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<Document>, RepositoryError> {
        self.inner.list_documents_by_project(project_id).await
    }

    async fn list_documents(&self) -> Result<Vec<Document>, RepositoryError> {
        self.inner.list_documents().await
    }

    async fn store_signed_url(
        &self,
        id: DocumentId,
        signed_url: &SignedUrl,
    ) -> Result<(), RepositoryError> {
        self.cached_urls.fetch_add(1, Ordering::SeqCst);
        self.inner.store_signed_url(id, signed_url).await
    }
}

/// In-memory index whose deletes always fail.
#[derive(Default)]
pub struct UndeletableVectorIndex {
    inner: InMemoryVectorIndex,
}

#[async_trait]
impl VectorIndex for UndeletableVectorIndex {
    async fn upsert(&self, record: EmbeddingRecord) -> Result<(), VectorIndexError> {
        self.inner.upsert(record).await
    }

    async fn query(
        &self,
        namespace: &Namespace,
        embedding: &Embedding,
        top_k: usize,
    ) -> Result<Vec<VectorMatch>, VectorIndexError> {
        self.inner.query(namespace, embedding, top_k).await
    }

    async fn delete_many(&self, _: &Namespace, _: &[VectorId]) -> Result<(), VectorIndexError> {
        Err(VectorIndexError::DeleteFailed("index unreachable".into()))
    }

    async fn delete_namespace(&self, _: &Namespace) -> Result<(), VectorIndexError> {
        Err(VectorIndexError::NamespaceDeletionFailed("index unreachable".into()))
    }
}

pub struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    async fn embed(&self, _: &str) -> Result<Embedding, EmbedderError> {
        Err(EmbedderError::ApiRequestFailed("upstream 503".into()))
    }
}

/// Never answers. Used to drive job timeouts.
pub struct HangingEmbedder;

#[async_trait]
impl Embedder for HangingEmbedder {
    async fn embed(&self, _: &str) -> Result<Embedding, EmbedderError> {
        std::future::pending().await
    }
}

/// Records every text it is asked to embed.
pub struct RecordingEmbedder {
    pub inputs: Mutex<Vec<String>>,
    dimension: usize,
}

impl RecordingEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            inputs: Mutex::new(Vec::new()),
            dimension,
        }
    }
}

#[async_trait]
impl Embedder for RecordingEmbedder {
    async fn embed(&self, text: &str) -> Result<Embedding, EmbedderError> {
        self.inputs.lock().await.push(text.to_string());
        let mut values = vec![0.0; self.dimension];
        values[text.len() % self.dimension] = 1.0;
        Ok(Embedding::new(values))
    }
}

/// Forwards to a real mirror, holding back document snapshots in one status.
pub struct SlowMirror {
    inner: Arc<dyn MetadataMirror>,
    slow_status: DocumentStatus,
    delay: Duration,
}

impl SlowMirror {
    pub fn delaying(
        inner: Arc<dyn MetadataMirror>,
        slow_status: DocumentStatus,
        delay: Duration,
    ) -> Self {
        Self {
            inner,
            slow_status,
            delay,
        }
    }
}

#[async_trait]
impl MetadataMirror for SlowMirror {
    async fn put_project(&self, project: &Project) -> Result<(), MirrorError> {
        self.inner.put_project(project).await
    }

    async fn delete_project(&self, id: ProjectId) -> Result<(), MirrorError> {
        self.inner.delete_project(id).await
    }

    async fn get_project(&self, id: ProjectId) -> Result<Option<Project>, MirrorError> {
        self.inner.get_project(id).await
    }

    async fn put_document(&self, document: &Document) -> Result<(), MirrorError> {
        if document.status == self.slow_status {
            tokio::time::sleep(self.delay).await;
        }
        self.inner.put_document(document).await
    }

    async fn delete_document(
        &self,
        project_id: ProjectId,
        id: DocumentId,
    ) -> Result<(), MirrorError> {
        self.inner.delete_document(project_id, id).await
    }

    async fn get_document(
        &self,
        project_id: ProjectId,
        id: DocumentId,
    ) -> Result<Option<Document>, MirrorError> {
        self.inner.get_document(project_id, id).await
    }
}

/// Hashing embedder that takes `delay` per call and counts calls.
pub struct SlowEmbedder {
    inner: HashingEmbedder,
    delay: Duration,
    pub calls: AtomicUsize,
}

impl SlowEmbedder {
    pub fn new(dimension: usize, delay: Duration) -> Self {
        Self {
            inner: HashingEmbedder::new(dimension),
            delay,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Embedder for SlowEmbedder {
    async fn embed(&self, text: &str) -> Result<Embedding, EmbedderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.inner.embed(text).await
    }
}

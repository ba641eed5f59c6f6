#![allow(dead_code)]

pub mod doubles;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use object_store::memory::InMemory;

use scopeiq::application::ports::{
    BlobStore, Embedder, FileLoader, MetadataMirror, MetadataStore, VectorIndex,
};
use scopeiq::application::services::{
    BackgroundQueue, DocumentProcessor, EmbeddingService, JobMetadata, JobTicket, MirrorSync,
    NewDocument, NewProject, StatusWriter, SyncFacade, TextExtractionService,
};
use scopeiq::domain::{CompanyId, Document, DocumentId, DocumentStatus, Project, StorageKey};
use scopeiq::infrastructure::embedding::HashingEmbedder;
use scopeiq::infrastructure::persistence::{InMemoryMetadataStore, InMemoryVectorIndex};
use scopeiq::infrastructure::storage::{BlobMetadataMirror, LocalUrlSigner, ObjectBlobStore};
use scopeiq::infrastructure::text_processing::CompositeFileLoader;

pub const TEST_SIGNING_SECRET: &str = "test-signing-secret";
pub const TEST_BASE_URL: &str = "http://localhost:3000";
pub const TEST_DIMENSIONS: usize = 64;
pub const TEST_TTL: Duration = Duration::from_secs(3600);

#[derive(Default)]
pub struct StackOptions {
    pub metadata_store: Option<Arc<dyn MetadataStore>>,
    pub blob_store: Option<Arc<dyn BlobStore>>,
    pub mirror: Option<Arc<dyn MetadataMirror>>,
    pub vector_index: Option<Arc<dyn VectorIndex>>,
    pub embedder: Option<Arc<dyn Embedder>>,
    pub file_loader: Option<Arc<dyn FileLoader>>,
    pub min_delay: Duration,
    pub job_timeout: Option<Duration>,
    pub max_input_tokens: Option<usize>,
    pub queue_capacity: Option<usize>,
}

/// Fully wired in-process stack. Must be built inside a Tokio runtime because
/// the background worker is spawned immediately.
pub struct Stack {
    pub facade: SyncFacade,
    pub metadata_store: Arc<dyn MetadataStore>,
    pub blob_store: Arc<dyn BlobStore>,
    pub vector_index: Arc<dyn VectorIndex>,
    pub embeddings: Arc<EmbeddingService>,
    pub queue: BackgroundQueue,
    pub mirror_objects: Arc<InMemory>,
    pub mirror: Arc<BlobMetadataMirror>,
    pub signer: Arc<LocalUrlSigner>,
}

impl Stack {
    pub fn new() -> Self {
        Self::with(StackOptions::default())
    }

    pub fn with(options: StackOptions) -> Self {
        let signer = Arc::new(LocalUrlSigner::new(TEST_BASE_URL, TEST_SIGNING_SECRET));

        let metadata_store = options
            .metadata_store
            .unwrap_or_else(|| Arc::new(InMemoryMetadataStore::new()));
        let blob_store = options.blob_store.unwrap_or_else(|| {
            Arc::new(ObjectBlobStore::new(
                Arc::new(InMemory::new()),
                Arc::clone(&signer) as _,
            ))
        });
        let vector_index = options
            .vector_index
            .unwrap_or_else(|| Arc::new(InMemoryVectorIndex::new()));
        let embedder = options
            .embedder
            .unwrap_or_else(|| Arc::new(HashingEmbedder::new(TEST_DIMENSIONS)));
        let file_loader = options
            .file_loader
            .unwrap_or_else(|| Arc::new(CompositeFileLoader::standard()));

        let mirror_objects = Arc::new(InMemory::new());
        let mirror = Arc::new(BlobMetadataMirror::new(
            Arc::clone(&mirror_objects) as _,
            "metadata",
        ));
        let mirror_sync = MirrorSync::new(
            options
                .mirror
                .unwrap_or_else(|| Arc::clone(&mirror) as Arc<dyn MetadataMirror>),
        );

        let embeddings = Arc::new(EmbeddingService::new(
            embedder,
            Arc::clone(&vector_index),
            options.max_input_tokens.unwrap_or(8000),
        ));

        let processor = Arc::new(DocumentProcessor::new(
            Arc::clone(&blob_store),
            TextExtractionService::new(file_loader),
            Arc::clone(&embeddings),
            StatusWriter::new(Arc::clone(&metadata_store), mirror_sync.clone()),
            options.job_timeout,
        ));
        let (queue, worker) = BackgroundQueue::new(
            processor,
            options.queue_capacity.unwrap_or(64),
            options.min_delay,
        );
        tokio::spawn(worker.run());

        let facade = SyncFacade::new(
            Arc::clone(&metadata_store),
            Arc::clone(&blob_store),
            mirror_sync,
            Arc::clone(&embeddings),
            queue.clone(),
            TEST_TTL,
        );

        Self {
            facade,
            metadata_store,
            blob_store,
            vector_index,
            embeddings,
            queue,
            mirror_objects,
            mirror,
            signer,
        }
    }

    pub async fn project(&self, name: &str) -> Project {
        self.facade
            .create_project(NewProject {
                company_id: CompanyId::new("acme"),
                name: name.to_string(),
                description: None,
                slug: None,
            })
            .await
            .unwrap()
    }

    /// Stores a document without content, so nothing is queued.
    pub async fn placeholder(&self, project: &Project, name: &str) -> Document {
        self.facade
            .create_document(
                project.id,
                NewDocument {
                    name: name.to_string(),
                    mime_type: "application/pdf".to_string(),
                    thumbnail_key: None,
                    content: None,
                },
            )
            .await
            .unwrap()
    }

    pub async fn upload(&self, project: &Project, name: &str, mime: &str, body: &[u8]) -> Document {
        self.facade
            .create_document(
                project.id,
                NewDocument {
                    name: name.to_string(),
                    mime_type: mime.to_string(),
                    thumbnail_key: None,
                    content: Some(Bytes::copy_from_slice(body)),
                },
            )
            .await
            .unwrap()
    }
}

impl Stack {
    /// Records a document, stores `body` under its own key and queues a job
    /// for it directly, returning the job's ticket.
    pub async fn submit(
        &self,
        project: &Project,
        name: &str,
        mime: &str,
        body: &[u8],
    ) -> (Document, JobTicket) {
        let document = self
            .facade
            .create_document(
                project.id,
                NewDocument {
                    name: name.to_string(),
                    mime_type: mime.to_string(),
                    thumbnail_key: None,
                    content: None,
                },
            )
            .await
            .unwrap();
        let key = StorageKey::from_raw(format!("acme/{}/files/{}_{}", project.id, document.id, name));
        self.blob_store
            .put(&key, Bytes::copy_from_slice(body))
            .await
            .unwrap();
        let ticket = self
            .queue
            .enqueue(
                project.company_id.clone(),
                project.id,
                document.id,
                key,
                JobMetadata {
                    file_name: name.to_string(),
                    mime_type: mime.to_string(),
                },
            )
            .unwrap();
        (document, ticket)
    }

    pub async fn wait_for_status(&self, id: DocumentId, status: DocumentStatus) -> bool {
        eventually(|| async move {
            self.metadata_store
                .get_document(id)
                .await
                .ok()
                .flatten()
                .is_some_and(|d| d.status == status)
        })
        .await
    }
}

/// Polls `check` until it returns true, sleeping between attempts. Used to
/// observe fire-and-forget side effects.
pub async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..200 {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

/// Splits a locally signed URL into `(key, expires, nonce, signature)`.
pub fn parse_local_url(url: &str) -> (String, i64, String, String) {
    let parsed = reqwest::Url::parse(url).unwrap();
    let key = parsed.path().strip_prefix("/files/").unwrap().to_string();
    let mut expires = 0;
    let mut nonce = String::new();
    let mut signature = String::new();
    for (k, v) in parsed.query_pairs() {
        match k.as_ref() {
            "expires" => expires = v.parse().unwrap(),
            "nonce" => nonce = v.into_owned(),
            "signature" => signature = v.into_owned(),
            _ => {}
        }
    }
    (key, expires, nonce, signature)
}

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;

use scopeiq::application::ports::{MetadataMirror, MetadataStore, VectorIndex};
use scopeiq::application::services::{
    BackgroundQueue, DocumentProcessor, EmbeddingService, MirrorSync, StatusWriter, SyncFacade,
    TextExtractionService,
};
use scopeiq::infrastructure::embedding::EmbedderFactory;
use scopeiq::infrastructure::observability::{TracingConfig, init_tracing};
use scopeiq::infrastructure::persistence::{
    InMemoryMetadataStore, InMemoryVectorIndex, PgMetadataStore, QdrantAdapter, create_pool,
    run_migrations, shared_qdrant_client,
};
use scopeiq::infrastructure::storage::{BlobMetadataMirror, shared_object_store};
use scopeiq::infrastructure::text_processing::CompositeFileLoader;
use scopeiq::presentation::{AppState, Environment, Settings, create_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(anyhow::Error::msg)?;

    let settings = Settings::load(environment).context("Failed to load settings")?;

    init_tracing(
        &TracingConfig::from_settings(environment, &settings.logging),
        settings.server.port,
    );

    let metadata_store: Arc<dyn MetadataStore> = match &settings.database.url {
        Some(url) => {
            let pool = create_pool(url, settings.database.max_connections).await?;
            run_migrations(&pool).await?;
            Arc::new(PgMetadataStore::new(pool))
        }
        None => {
            tracing::warn!("database.url not set, using in-memory metadata store");
            Arc::new(InMemoryMetadataStore::new())
        }
    };

    let storage = shared_object_store(&settings.storage)
        .await
        .context("Failed to initialize blob storage")?;

    let mirror = if settings.mirror.enabled {
        let mirror: Arc<dyn MetadataMirror> = Arc::new(BlobMetadataMirror::new(
            Arc::clone(&storage.object_store),
            settings.mirror.prefix.clone(),
        ));
        MirrorSync::new(mirror)
    } else {
        MirrorSync::disabled()
    };

    let vector_index: Arc<dyn VectorIndex> = match &settings.qdrant.url {
        Some(url) => {
            let client = shared_qdrant_client(url).await?;
            Arc::new(QdrantAdapter::with_client(
                client,
                settings.qdrant.namespace_prefix.clone(),
                settings.qdrant.vector_dimensions,
            ))
        }
        None => {
            tracing::warn!("qdrant.url not set, using in-memory vector index");
            Arc::new(InMemoryVectorIndex::new())
        }
    };

    let embedder = EmbedderFactory::create(&settings.embeddings)?;
    let embeddings = Arc::new(EmbeddingService::new(
        embedder,
        vector_index,
        settings.embeddings.max_input_tokens,
    ));

    let processor = Arc::new(DocumentProcessor::new(
        Arc::clone(&storage.blob_store),
        TextExtractionService::new(Arc::new(CompositeFileLoader::standard())),
        Arc::clone(&embeddings),
        StatusWriter::new(Arc::clone(&metadata_store), mirror.clone()),
        settings.queue.job_timeout_secs.map(Duration::from_secs),
    ));

    let (queue, worker) = BackgroundQueue::new(
        processor,
        settings.queue.capacity,
        Duration::from_millis(settings.queue.min_delay_ms),
    );
    tokio::spawn(worker.run());

    let facade = Arc::new(SyncFacade::new(
        metadata_store,
        Arc::clone(&storage.blob_store),
        mirror,
        embeddings,
        queue,
        Duration::from_secs(settings.storage.signed_url_ttl_secs),
    ));

    let state = AppState {
        facade,
        blob_store: storage.blob_store,
        local_signer: storage.local_signer,
    };

    let router = create_router(state);

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port)
        .parse()
        .context("Invalid server host/port")?;
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}

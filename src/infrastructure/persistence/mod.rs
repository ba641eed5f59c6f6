mod clients;
mod pg_pool;
mod repositories;
mod vector_index;

pub use clients::shared_qdrant_client;
pub use pg_pool::{create_pool, run_migrations};
pub use repositories::{InMemoryMetadataStore, PgMetadataStore};
pub use vector_index::{InMemoryVectorIndex, QdrantAdapter};

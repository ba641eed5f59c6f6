mod in_memory_metadata_store;
mod pg_metadata_store;

pub use in_memory_metadata_store::InMemoryMetadataStore;
pub use pg_metadata_store::PgMetadataStore;

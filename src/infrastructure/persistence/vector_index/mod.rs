mod in_memory_vector_index;
mod qdrant_adapter;

pub use in_memory_vector_index::InMemoryVectorIndex;
pub use qdrant_adapter::QdrantAdapter;

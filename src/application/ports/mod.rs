mod blob_store;
mod distance_metric;
mod embedder;
mod file_loader;
mod metadata_mirror;
mod metadata_store;
mod namespace_config;
mod payload_index;
mod repository_error;
mod vector_index;
mod vector_index_error;
mod vector_match;

pub use blob_store::{BlobStore, BlobStoreError, UrlSigner};
pub use distance_metric::DistanceMetric;
pub use embedder::{Embedder, EmbedderError};
pub use file_loader::{FileLoader, FileLoaderError};
pub use metadata_mirror::{MetadataMirror, MirrorError};
pub use metadata_store::MetadataStore;
pub use namespace_config::NamespaceConfig;
pub use payload_index::{PayloadFieldType, PayloadIndex};
pub use repository_error::RepositoryError;
pub use vector_index::VectorIndex;
pub use vector_index_error::VectorIndexError;
pub use vector_match::VectorMatch;

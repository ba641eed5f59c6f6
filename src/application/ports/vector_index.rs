use async_trait::async_trait;

use super::{VectorIndexError, VectorMatch};
use crate::domain::{Embedding, EmbeddingRecord, Namespace, VectorId};

/// Namespace-partitioned vector storage. A query never crosses namespaces.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn upsert(&self, record: EmbeddingRecord) -> Result<(), VectorIndexError>;

    async fn query(
        &self,
        namespace: &Namespace,
        embedding: &Embedding,
        top_k: usize,
    ) -> Result<Vec<VectorMatch>, VectorIndexError>;

    /// Missing namespace or ids are a no-op.
    async fn delete_many(
        &self,
        namespace: &Namespace,
        ids: &[VectorId],
    ) -> Result<(), VectorIndexError>;

    async fn delete_namespace(&self, namespace: &Namespace) -> Result<(), VectorIndexError>;
}

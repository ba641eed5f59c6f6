use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use crate::application::ports::{VectorIndex, VectorIndexError, VectorMatch};
use crate::domain::{Embedding, EmbeddingRecord, Namespace, VectorId};

struct StoredVector {
    embedding: Embedding,
    metadata: Map<String, Value>,
}

/// Brute-force cosine index. Each namespace is a separate map, so a query
/// can only ever see its own namespace.
#[derive(Default)]
pub struct InMemoryVectorIndex {
    namespaces: RwLock<HashMap<Namespace, HashMap<VectorId, StoredVector>>>,
}

impl InMemoryVectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn namespace_len(&self, namespace: &Namespace) -> usize {
        self.namespaces
            .read()
            .await
            .get(namespace)
            .map_or(0, HashMap::len)
    }
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    async fn upsert(&self, record: EmbeddingRecord) -> Result<(), VectorIndexError> {
        let mut namespaces = self.namespaces.write().await;
        let vectors = namespaces.entry(record.namespace.clone()).or_default();

        let expected = vectors.values().next().map(|v| v.embedding.dimensions());
        if let Some(expected) = expected {
            if expected != record.embedding.dimensions() {
                return Err(VectorIndexError::UpsertFailed(format!(
                    "dimension mismatch in namespace {}: expected {expected}, got {}",
                    record.namespace,
                    record.embedding.dimensions()
                )));
            }
        }

        vectors.insert(
            record.id,
            StoredVector {
                embedding: record.embedding,
                metadata: record.metadata,
            },
        );
        Ok(())
    }

    async fn query(
        &self,
        namespace: &Namespace,
        embedding: &Embedding,
        top_k: usize,
    ) -> Result<Vec<VectorMatch>, VectorIndexError> {
        let namespaces = self.namespaces.read().await;
        let Some(vectors) = namespaces.get(namespace) else {
            return Ok(Vec::new());
        };

        let mut matches: Vec<VectorMatch> = vectors
            .iter()
            .map(|(id, stored)| VectorMatch {
                id: id.clone(),
                score: embedding.cosine_similarity(&stored.embedding),
                metadata: stored.metadata.clone(),
            })
            .collect();
        matches.sort_by(|a, b| b.score.total_cmp(&a.score));
        matches.truncate(top_k);
        Ok(matches)
    }

    async fn delete_many(
        &self,
        namespace: &Namespace,
        ids: &[VectorId],
    ) -> Result<(), VectorIndexError> {
        if let Some(vectors) = self.namespaces.write().await.get_mut(namespace) {
            for id in ids {
                vectors.remove(id);
            }
        }
        Ok(())
    }

    async fn delete_namespace(&self, namespace: &Namespace) -> Result<(), VectorIndexError> {
        self.namespaces.write().await.remove(namespace);
        Ok(())
    }
}

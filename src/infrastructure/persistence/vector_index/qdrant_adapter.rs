use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use qdrant_client::Qdrant;
use qdrant_client::qdrant::{
    CreateCollectionBuilder, CreateFieldIndexCollectionBuilder, DeletePointsBuilder, Distance,
    FieldType, PointId, PointStruct, PointsIdsList, SearchPointsBuilder, UpsertPointsBuilder,
    VectorParamsBuilder, VectorsConfig,
};
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::application::ports::{
    DistanceMetric, NamespaceConfig, PayloadFieldType, VectorIndex, VectorIndexError, VectorMatch,
};
use crate::domain::{Embedding, EmbeddingRecord, Namespace, VectorId};

/// Payload key carrying the caller's vector id; Qdrant point ids must be UUIDs.
const VECTOR_ID_KEY: &str = "vector_id";

/// One Qdrant collection per namespace, created on first upsert.
pub struct QdrantAdapter {
    client: Arc<Qdrant>,
    collection_prefix: String,
    vector_dimensions: u64,
    known_collections: RwLock<HashSet<String>>,
}

impl QdrantAdapter {
    pub fn new(
        url: &str,
        collection_prefix: impl Into<String>,
        vector_dimensions: u64,
    ) -> Result<Self, VectorIndexError> {
        let client = Qdrant::from_url(url)
            .build()
            .map_err(|e| VectorIndexError::ConnectionFailed(e.to_string()))?;

        Ok(Self::with_client(
            Arc::new(client),
            collection_prefix,
            vector_dimensions,
        ))
    }

    pub fn with_client(
        client: Arc<Qdrant>,
        collection_prefix: impl Into<String>,
        vector_dimensions: u64,
    ) -> Self {
        Self {
            client,
            collection_prefix: collection_prefix.into(),
            vector_dimensions,
            known_collections: RwLock::new(HashSet::new()),
        }
    }

    pub fn collection_name(&self, namespace: &Namespace) -> String {
        format!("{}{}", self.collection_prefix, namespace)
    }

    /// Deterministic so re-upserting the same id overwrites the same point.
    pub fn point_uuid(namespace: &Namespace, id: &VectorId) -> Uuid {
        Uuid::new_v5(
            &Uuid::NAMESPACE_OID,
            format!("{}/{}", namespace, id).as_bytes(),
        )
    }

    fn map_distance_metric(metric: &DistanceMetric) -> Distance {
        match metric {
            DistanceMetric::Cosine => Distance::Cosine,
            DistanceMetric::Euclidean => Distance::Euclid,
            DistanceMetric::DotProduct => Distance::Dot,
        }
    }

    fn map_field_type(field_type: &PayloadFieldType) -> FieldType {
        match field_type {
            PayloadFieldType::Keyword => FieldType::Keyword,
            PayloadFieldType::Integer => FieldType::Integer,
            PayloadFieldType::Text => FieldType::Text,
        }
    }

    async fn collection_exists(&self, collection: &str) -> Result<bool, VectorIndexError> {
        if self.known_collections.read().await.contains(collection) {
            return Ok(true);
        }
        let exists = self
            .client
            .collection_exists(collection)
            .await
            .map_err(|e| VectorIndexError::ConnectionFailed(e.to_string()))?;
        if exists {
            self.known_collections
                .write()
                .await
                .insert(collection.to_string());
        }
        Ok(exists)
    }

    #[instrument(skip(self, config), fields(collection = %collection))]
    async fn ensure_collection(
        &self,
        collection: &str,
        config: &NamespaceConfig,
    ) -> Result<(), VectorIndexError> {
        if self.collection_exists(collection).await? {
            return Ok(());
        }

        let vectors_config = VectorsConfig::from(VectorParamsBuilder::new(
            config.vector_dimensions,
            Self::map_distance_metric(&config.distance_metric),
        ));

        if let Err(e) = self
            .client
            .create_collection(
                CreateCollectionBuilder::new(collection).vectors_config(vectors_config),
            )
            .await
        {
            // A concurrent upsert may have created it first.
            let created_elsewhere = self
                .client
                .collection_exists(collection)
                .await
                .unwrap_or(false);
            if !created_elsewhere {
                return Err(VectorIndexError::NamespaceCreationFailed(e.to_string()));
            }
        } else {
            info!(collection = %collection, "collection_created");

            for index in &config.payload_indexes {
                self.client
                    .create_field_index(CreateFieldIndexCollectionBuilder::new(
                        collection,
                        &index.field_name,
                        Self::map_field_type(&index.field_type),
                    ))
                    .await
                    .map_err(|e| VectorIndexError::PayloadIndexFailed(e.to_string()))?;

                info!(collection = %collection, field = %index.field_name, "payload_index_applied");
            }
        }

        self.known_collections
            .write()
            .await
            .insert(collection.to_string());
        Ok(())
    }
}

#[async_trait]
impl VectorIndex for QdrantAdapter {
    #[instrument(skip(self, record), fields(namespace = %record.namespace, vector_id = %record.id))]
    async fn upsert(&self, record: EmbeddingRecord) -> Result<(), VectorIndexError> {
        let dimensions = record.embedding.dimensions() as u64;
        if dimensions != self.vector_dimensions {
            return Err(VectorIndexError::UpsertFailed(format!(
                "expected {} dimensions, got {dimensions}",
                self.vector_dimensions
            )));
        }

        let collection = self.collection_name(&record.namespace);
        let config = NamespaceConfig::new(self.vector_dimensions);
        self.ensure_collection(&collection, &config).await?;

        let mut payload: HashMap<String, Value> = record.metadata.into_iter().collect();
        payload.insert(
            VECTOR_ID_KEY.to_string(),
            Value::String(record.id.as_str().to_string()),
        );

        let point = PointStruct::new(
            PointId::from(Self::point_uuid(&record.namespace, &record.id).to_string()),
            record.embedding.values,
            payload,
        );

        self.client
            .upsert_points(UpsertPointsBuilder::new(&collection, vec![point]).wait(true))
            .await
            .map_err(|e| VectorIndexError::UpsertFailed(e.to_string()))?;

        info!(collection = %collection, "point_upserted");
        Ok(())
    }

    #[instrument(skip(self, embedding), fields(namespace = %namespace, top_k = top_k))]
    async fn query(
        &self,
        namespace: &Namespace,
        embedding: &Embedding,
        top_k: usize,
    ) -> Result<Vec<VectorMatch>, VectorIndexError> {
        let collection = self.collection_name(namespace);
        if top_k == 0 || !self.collection_exists(&collection).await? {
            return Ok(Vec::new());
        }

        let response = self
            .client
            .search_points(
                SearchPointsBuilder::new(&collection, embedding.values.clone(), top_k as u64)
                    .with_payload(true),
            )
            .await
            .map_err(|e| VectorIndexError::QueryFailed(e.to_string()))?;

        let matches = response
            .result
            .into_iter()
            .filter_map(|point| {
                let mut metadata: Map<String, Value> = point
                    .payload
                    .into_iter()
                    .map(|(key, value)| (key, value.into_json()))
                    .collect();
                let id = match metadata.remove(VECTOR_ID_KEY) {
                    Some(Value::String(raw)) => VectorId::sanitize(&raw),
                    _ => return None,
                };
                Some(VectorMatch {
                    id,
                    score: point.score,
                    metadata,
                })
            })
            .collect();

        Ok(matches)
    }

    #[instrument(skip(self, ids), fields(namespace = %namespace, count = ids.len()))]
    async fn delete_many(
        &self,
        namespace: &Namespace,
        ids: &[VectorId],
    ) -> Result<(), VectorIndexError> {
        let collection = self.collection_name(namespace);
        if ids.is_empty() || !self.collection_exists(&collection).await? {
            return Ok(());
        }

        let point_ids: Vec<PointId> = ids
            .iter()
            .map(|id| PointId::from(Self::point_uuid(namespace, id).to_string()))
            .collect();

        self.client
            .delete_points(
                DeletePointsBuilder::new(&collection)
                    .points(PointsIdsList { ids: point_ids })
                    .wait(true),
            )
            .await
            .map_err(|e| VectorIndexError::DeleteFailed(e.to_string()))?;

        info!(collection = %collection, count = ids.len(), "points_deleted");
        Ok(())
    }

    #[instrument(skip(self), fields(namespace = %namespace))]
    async fn delete_namespace(&self, namespace: &Namespace) -> Result<(), VectorIndexError> {
        let collection = self.collection_name(namespace);
        if !self.collection_exists(&collection).await? {
            return Ok(());
        }

        self.client
            .delete_collection(&collection)
            .await
            .map_err(|e| VectorIndexError::NamespaceDeletionFailed(e.to_string()))?;
        self.known_collections.write().await.remove(&collection);

        info!(collection = %collection, "collection_deleted");
        Ok(())
    }
}

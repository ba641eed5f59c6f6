use std::sync::Arc;

use serde_json::{Map, Value};

use crate::application::ports::{Embedder, EmbedderError, VectorIndex, VectorIndexError};
use crate::application::services::truncate_to_tokens;
use crate::domain::{DocumentId, Embedding, EmbeddingRecord, Namespace, ProjectId, VectorId};
use crate::infrastructure::observability::sanitize_prompt;

pub const CONTENT_KEY: &str = "content";
pub const DOCUMENT_ID_KEY: &str = "document_id";
pub const PROJECT_ID_KEY: &str = "project_id";

pub struct EmbeddingService {
    embedder: Arc<dyn Embedder>,
    vector_index: Arc<dyn VectorIndex>,
    max_input_tokens: usize,
}

impl EmbeddingService {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        vector_index: Arc<dyn VectorIndex>,
        max_input_tokens: usize,
    ) -> Self {
        Self {
            embedder,
            vector_index,
            max_input_tokens,
        }
    }

    pub async fn generate_embedding(&self, text: &str) -> Result<Embedding, EmbeddingServiceError> {
        if text.trim().is_empty() {
            return Err(EmbeddingServiceError::EmptyContent);
        }
        let input = truncate_to_tokens(text, self.max_input_tokens);
        self.embedder
            .embed(&input)
            .await
            .map_err(EmbeddingServiceError::Embedding)
    }

    /// Embeds `content` and stores it under the project's namespace. The full
    /// content travels in the vector metadata so a hit is self-describing.
    #[tracing::instrument(skip(self, content, metadata), fields(project_id = %project_id, document_id = %document_id))]
    pub async fn upsert_document_embedding(
        &self,
        project_id: &ProjectId,
        document_id: &DocumentId,
        content: &str,
        metadata: Map<String, Value>,
    ) -> Result<VectorId, EmbeddingServiceError> {
        let embedding = self.generate_embedding(content).await?;
        let id = VectorId::for_document(document_id);

        let mut metadata = metadata;
        metadata.insert(CONTENT_KEY.to_string(), Value::String(content.to_string()));
        metadata.insert(
            DOCUMENT_ID_KEY.to_string(),
            Value::String(document_id.to_string()),
        );
        metadata.insert(
            PROJECT_ID_KEY.to_string(),
            Value::String(project_id.to_string()),
        );

        self.vector_index
            .upsert(EmbeddingRecord {
                id: id.clone(),
                namespace: Namespace::for_project(project_id),
                embedding,
                metadata,
            })
            .await?;

        tracing::info!(vector_id = %id, "Document embedding upserted");
        Ok(id)
    }

    #[tracing::instrument(skip(self, query), fields(project_id = %project_id))]
    pub async fn semantic_search(
        &self,
        project_id: &ProjectId,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<SearchHit>, EmbeddingServiceError> {
        tracing::debug!(query = %sanitize_prompt(query), "Semantic search");
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let embedding = self.generate_embedding(query).await?;
        let matches = self
            .vector_index
            .query(&Namespace::for_project(project_id), &embedding, top_k)
            .await?;

        Ok(matches
            .into_iter()
            .map(|m| {
                let document_id = m
                    .metadata
                    .get(DOCUMENT_ID_KEY)
                    .and_then(Value::as_str)
                    .and_then(DocumentId::parse);
                let content = m
                    .metadata
                    .get(CONTENT_KEY)
                    .and_then(Value::as_str)
                    .map(str::to_string);
                SearchHit {
                    vector_id: m.id.to_string(),
                    document_id,
                    score: m.score,
                    distance: 1.0 - m.score,
                    content,
                    metadata: m.metadata,
                }
            })
            .collect())
    }

    pub async fn delete_embeddings(
        &self,
        namespace: &Namespace,
        ids: &[VectorId],
    ) -> Result<(), EmbeddingServiceError> {
        self.vector_index.delete_many(namespace, ids).await?;
        Ok(())
    }

    pub async fn delete_document_embedding(
        &self,
        project_id: &ProjectId,
        document_id: &DocumentId,
    ) -> Result<(), EmbeddingServiceError> {
        self.delete_embeddings(
            &Namespace::for_project(project_id),
            &[VectorId::for_document(document_id)],
        )
        .await
    }

    pub async fn delete_project_namespace(
        &self,
        project_id: &ProjectId,
    ) -> Result<(), EmbeddingServiceError> {
        self.vector_index
            .delete_namespace(&Namespace::for_project(project_id))
            .await?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct SearchHit {
    pub vector_id: String,
    pub document_id: Option<DocumentId>,
    pub score: f32,
    /// `1 - score`, lower is closer regardless of the index metric.
    pub distance: f32,
    pub content: Option<String>,
    pub metadata: Map<String, Value>,
}

#[derive(Debug, thiserror::Error)]
pub enum EmbeddingServiceError {
    #[error("content is empty")]
    EmptyContent,
    #[error("embedding: {0}")]
    Embedding(EmbedderError),
    #[error("vector index: {0}")]
    VectorIndex(#[from] VectorIndexError),
}

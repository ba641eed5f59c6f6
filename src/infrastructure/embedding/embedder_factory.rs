use std::sync::Arc;

use crate::application::ports::Embedder;
use crate::presentation::config::{EmbeddingProvider, EmbeddingsSettings};

use super::{HashingEmbedder, OpenAiEmbedder};

pub struct EmbedderFactory;

#[derive(Debug, thiserror::Error)]
pub enum EmbedderFactoryError {
    #[error("missing API key: OpenAI embedder requires embeddings.api_key")]
    MissingApiKey,
}

impl EmbedderFactory {
    pub fn create(settings: &EmbeddingsSettings) -> Result<Arc<dyn Embedder>, EmbedderFactoryError> {
        match settings.provider {
            EmbeddingProvider::Hashing => {
                tracing::info!(dimension = settings.dimension, "Using hashing embedder");
                Ok(Arc::new(HashingEmbedder::new(settings.dimension)))
            }
            EmbeddingProvider::OpenAi => {
                if settings.api_key.is_empty() {
                    return Err(EmbedderFactoryError::MissingApiKey);
                }
                tracing::info!(model = %settings.model, "Using OpenAI embedding model");
                let mut embedder = OpenAiEmbedder::new(
                    settings.api_key.clone(),
                    settings.model.clone(),
                    settings.dimension,
                );
                if let Some(base_url) = &settings.base_url {
                    embedder = embedder.with_base_url(base_url.clone());
                }
                Ok(Arc::new(embedder))
            }
        }
    }
}

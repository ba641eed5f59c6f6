use async_trait::async_trait;

use crate::domain::MediaType;

#[async_trait]
pub trait FileLoader: Send + Sync {
    async fn extract_text(
        &self,
        data: &[u8],
        media_type: MediaType,
    ) -> Result<String, FileLoaderError>;
}

#[derive(Debug, thiserror::Error)]
pub enum FileLoaderError {
    #[error("unsupported content type: {0:?}")]
    UnsupportedContentType(MediaType),
    #[error("extraction failed: {0}")]
    ExtractionFailed(String),
}

use std::sync::Arc;

use crate::application::ports::{FileLoader, FileLoaderError};
use crate::domain::MediaType;

/// Extraction that never fails outward: any loader error degrades to an empty
/// string. Deciding whether empty text is acceptable happens one layer up.
#[derive(Clone)]
pub struct TextExtractionService {
    loader: Arc<dyn FileLoader>,
}

impl TextExtractionService {
    pub fn new(loader: Arc<dyn FileLoader>) -> Self {
        Self { loader }
    }

    #[tracing::instrument(skip(self, data), fields(bytes = data.len(), media_type = ?media_type))]
    pub async fn extract_text(&self, data: &[u8], media_type: MediaType) -> String {
        match self.loader.extract_text(data, media_type).await {
            Ok(text) => text,
            Err(FileLoaderError::UnsupportedContentType(_)) => {
                tracing::debug!("No extractor for media type, treating as empty");
                String::new()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Text extraction failed, treating as empty");
                String::new()
            }
        }
    }
}

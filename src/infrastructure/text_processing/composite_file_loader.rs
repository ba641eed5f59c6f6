use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::application::ports::{FileLoader, FileLoaderError};
use crate::domain::MediaType;

use super::{DocxAdapter, LegacyDocAdapter, PdfAdapter, PlainTextAdapter};

pub struct CompositeFileLoader {
    adapters: HashMap<MediaType, Arc<dyn FileLoader>>,
}

impl CompositeFileLoader {
    pub fn new(adapters: Vec<(MediaType, Arc<dyn FileLoader>)>) -> Self {
        Self {
            adapters: adapters.into_iter().collect(),
        }
    }

    /// Text, PDF, docx and legacy doc.
    pub fn standard() -> Self {
        Self::new(vec![
            (MediaType::PlainText, Arc::new(PlainTextAdapter)),
            (MediaType::Pdf, Arc::new(PdfAdapter::new())),
            (MediaType::Docx, Arc::new(DocxAdapter::new())),
            (MediaType::LegacyDoc, Arc::new(LegacyDocAdapter)),
        ])
    }
}

#[async_trait]
impl FileLoader for CompositeFileLoader {
    async fn extract_text(
        &self,
        data: &[u8],
        media_type: MediaType,
    ) -> Result<String, FileLoaderError> {
        // Images have no text layer; that is an answer, not a failure.
        if media_type == MediaType::Image {
            return Ok(String::new());
        }

        let adapter = self
            .adapters
            .get(&media_type)
            .ok_or(FileLoaderError::UnsupportedContentType(media_type))?;

        adapter.extract_text(data, media_type).await
    }
}

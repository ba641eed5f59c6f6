use async_trait::async_trait;

use crate::application::ports::{FileLoader, FileLoaderError};
use crate::domain::MediaType;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

pub struct PlainTextAdapter;

#[async_trait]
impl FileLoader for PlainTextAdapter {
    async fn extract_text(
        &self,
        data: &[u8],
        media_type: MediaType,
    ) -> Result<String, FileLoaderError> {
        if media_type != MediaType::PlainText {
            return Err(FileLoaderError::UnsupportedContentType(media_type));
        }

        let data = data.strip_prefix(UTF8_BOM).unwrap_or(data);
        Ok(String::from_utf8_lossy(data).into_owned())
    }
}

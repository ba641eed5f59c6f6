use async_trait::async_trait;

use crate::application::ports::{FileLoader, FileLoaderError};
use crate::domain::MediaType;

use super::text_sanitizer::{sanitize_extracted_text, strip_control_bytes};

/// Binary `.doc` files get no real parsing: printable runs are kept and
/// everything else dropped. Output may contain noise from the binary format.
pub struct LegacyDocAdapter;

#[async_trait]
impl FileLoader for LegacyDocAdapter {
    async fn extract_text(
        &self,
        data: &[u8],
        media_type: MediaType,
    ) -> Result<String, FileLoaderError> {
        if media_type != MediaType::LegacyDoc {
            return Err(FileLoaderError::UnsupportedContentType(media_type));
        }

        let decoded = String::from_utf8_lossy(data);
        Ok(sanitize_extracted_text(&strip_control_bytes(&decoded)))
    }
}

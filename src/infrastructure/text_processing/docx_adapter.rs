use std::io::{Cursor, Read};

use async_trait::async_trait;
use quick_xml::Reader;
use quick_xml::events::Event;
use zip::ZipArchive;

use crate::application::ports::{FileLoader, FileLoaderError};
use crate::domain::MediaType;

use super::text_sanitizer::sanitize_extracted_text;

const DOCUMENT_PART: &str = "word/document.xml";

/// Reads the main document part of an OOXML package: `w:t` runs become text,
/// `w:p` ends become line breaks, `w:tab` and `w:br` are kept as whitespace.
#[derive(Default)]
pub struct DocxAdapter;

impl DocxAdapter {
    pub fn new() -> Self {
        Self
    }

    fn read_document_xml(data: &[u8]) -> Result<String, FileLoaderError> {
        let mut archive = ZipArchive::new(Cursor::new(data))
            .map_err(|e| FileLoaderError::ExtractionFailed(format!("not a docx package: {e}")))?;
        let mut part = archive.by_name(DOCUMENT_PART).map_err(|e| {
            FileLoaderError::ExtractionFailed(format!("missing {DOCUMENT_PART}: {e}"))
        })?;

        let mut xml = String::new();
        part.read_to_string(&mut xml)
            .map_err(|e| FileLoaderError::ExtractionFailed(e.to_string()))?;
        Ok(xml)
    }

    fn collect_text(xml: &str) -> Result<String, FileLoaderError> {
        let mut reader = Reader::from_str(xml);
        let mut out = String::new();
        let mut in_text_run = false;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) if e.name().as_ref() == b"w:t" => in_text_run = true,
                Ok(Event::End(e)) => match e.name().as_ref() {
                    b"w:t" => in_text_run = false,
                    b"w:p" => out.push('\n'),
                    _ => {}
                },
                Ok(Event::Empty(e)) => match e.name().as_ref() {
                    b"w:tab" => out.push('\t'),
                    b"w:br" | b"w:cr" => out.push('\n'),
                    _ => {}
                },
                Ok(Event::Text(t)) if in_text_run => {
                    let text = t
                        .unescape()
                        .map_err(|e| FileLoaderError::ExtractionFailed(e.to_string()))?;
                    out.push_str(&text);
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => {
                    return Err(FileLoaderError::ExtractionFailed(format!(
                        "malformed document.xml at {}: {e}",
                        reader.buffer_position()
                    )));
                }
            }
        }

        Ok(out)
    }
}

#[async_trait]
impl FileLoader for DocxAdapter {
    #[tracing::instrument(skip(self, data), fields(bytes = data.len()))]
    async fn extract_text(
        &self,
        data: &[u8],
        media_type: MediaType,
    ) -> Result<String, FileLoaderError> {
        if media_type != MediaType::Docx {
            return Err(FileLoaderError::UnsupportedContentType(media_type));
        }

        let owned = data.to_vec();
        let text = tokio::task::spawn_blocking(move || {
            Self::read_document_xml(&owned).and_then(|xml| Self::collect_text(&xml))
        })
        .await
        .map_err(|e| FileLoaderError::ExtractionFailed(format!("docx task aborted: {e}")))??;

        Ok(sanitize_extracted_text(&text))
    }
}

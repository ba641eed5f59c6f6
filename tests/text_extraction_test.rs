use std::io::{Cursor, Write};
use std::sync::Arc;

use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use scopeiq::application::ports::{FileLoader, FileLoaderError};
use scopeiq::application::services::TextExtractionService;
use scopeiq::domain::MediaType;
use scopeiq::infrastructure::text_processing::{
    CompositeFileLoader, DocxAdapter, PlainTextAdapter, sanitize_extracted_text,
    strip_control_bytes,
};

fn docx_with_body(body: &str) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file("[Content_Types].xml", SimpleFileOptions::default())
        .unwrap();
    writer.write_all(b"<Types/>").unwrap();
    writer
        .start_file("word/document.xml", SimpleFileOptions::default())
        .unwrap();
    write!(
        writer,
        r#"<?xml version="1.0" encoding="UTF-8"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
    )
    .unwrap();
    writer.finish().unwrap().into_inner()
}

#[tokio::test]
async fn given_docx_package_when_extracting_then_paragraph_text_is_returned() {
    let data = docx_with_body(
        "<w:p><w:r><w:t>Foundation</w:t></w:r><w:r><w:t xml:space=\"preserve\"> details</w:t></w:r></w:p>\
         <w:p><w:r><w:t>Load &amp; bearing</w:t><w:tab/><w:t>walls</w:t></w:r></w:p>",
    );

    let text = DocxAdapter::new()
        .extract_text(&data, MediaType::Docx)
        .await
        .unwrap();

    assert_eq!(text, "Foundation details\nLoad & bearing walls");
}

#[tokio::test]
async fn given_zip_without_document_part_when_extracting_docx_then_extraction_fails() {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file("readme.txt", SimpleFileOptions::default())
        .unwrap();
    writer.write_all(b"nothing here").unwrap();
    let data = writer.finish().unwrap().into_inner();

    let result = DocxAdapter::new().extract_text(&data, MediaType::Docx).await;

    assert!(matches!(result, Err(FileLoaderError::ExtractionFailed(_))));
}

#[tokio::test]
async fn given_legacy_doc_bytes_when_extracting_then_printable_runs_survive() {
    let loader = CompositeFileLoader::standard();

    let text = loader
        .extract_text(b"\x00\x01Hello\x02\x03   world\x07\n", MediaType::LegacyDoc)
        .await
        .unwrap();

    assert_eq!(text, "Hello world");
}

#[tokio::test]
async fn given_bom_prefixed_text_when_extracting_then_bom_is_dropped() {
    let text = PlainTextAdapter
        .extract_text(b"\xEF\xBB\xBFgrid lines", MediaType::PlainText)
        .await
        .unwrap();

    assert_eq!(text, "grid lines");
}

#[tokio::test]
async fn given_image_when_extracting_then_result_is_empty_text() {
    let loader = CompositeFileLoader::standard();

    let text = loader.extract_text(b"\x89PNG", MediaType::Image).await.unwrap();

    assert!(text.is_empty());
}

#[tokio::test]
async fn given_unknown_media_type_when_extracting_then_loader_reports_unsupported() {
    let loader = CompositeFileLoader::standard();

    let result = loader.extract_text(b"PK", MediaType::Unknown).await;

    assert!(matches!(
        result,
        Err(FileLoaderError::UnsupportedContentType(MediaType::Unknown))
    ));
}

#[tokio::test]
async fn given_corrupt_pdf_when_extracting_through_service_then_text_is_empty() {
    let service = TextExtractionService::new(Arc::new(CompositeFileLoader::standard()));

    let text = service
        .extract_text(b"%PDF-1.7 this is not really a pdf", MediaType::Pdf)
        .await;

    assert!(text.is_empty());
}

#[tokio::test]
async fn given_unsupported_type_when_extracting_through_service_then_text_is_empty() {
    let service = TextExtractionService::new(Arc::new(CompositeFileLoader::standard()));

    assert!(service.extract_text(b"data", MediaType::Unknown).await.is_empty());
}

#[test]
fn given_hyphenated_line_break_when_sanitizing_then_word_is_rejoined() {
    let text = sanitize_extracted_text("rein-\nforcement   bars\n\n\n\nsecond   paragraph");

    assert_eq!(text, "reinforcement bars\n\nsecond paragraph");
}

#[test]
fn given_compatibility_characters_when_sanitizing_then_they_are_normalized() {
    assert_eq!(sanitize_extracted_text("ﬁnish\u{0007} coat"), "finish coat");
}

#[test]
fn given_control_bytes_when_stripping_then_line_breaks_and_tabs_remain() {
    assert_eq!(strip_control_bytes("a\u{0000}b\tc\nd\u{FFFD}"), "a b\tc\nd ");
}

use std::time::Duration;

use chrono::{TimeZone, Utc};

use scopeiq::domain::{
    CompanyId, Document, DocumentId, DocumentStatus, DocumentStatusError, Embedding, MediaType,
    Namespace, Project, ProjectId, SignedUrl, StorageKey, VectorId, slugify,
};

#[test]
fn given_mixed_punctuation_name_when_slugified_then_runs_collapse_to_single_dash() {
    assert_eq!(slugify("  Riverside Tower -- Phase 2! "), "riverside-tower-phase-2");
    assert_eq!(slugify("ALPHA_beta.gamma"), "alpha-beta-gamma");
    assert_eq!(slugify("***"), "");
}

#[test]
fn given_uploaded_document_when_walking_pipeline_then_only_forward_transitions_are_legal() {
    let mut document = Document::new(ProjectId::new(), "a.pdf".into(), "application/pdf".into(), 3);
    assert_eq!(document.status, DocumentStatus::Uploaded);

    document.transition_to(DocumentStatus::Processing).unwrap();
    document.transition_to(DocumentStatus::Processed).unwrap();

    let err = document.transition_to(DocumentStatus::Processing).unwrap_err();
    assert_eq!(
        err,
        DocumentStatusError::IllegalTransition {
            from: DocumentStatus::Processed,
            to: DocumentStatus::Processing,
        }
    );
}

#[test]
fn given_uploaded_document_when_jumping_to_terminal_state_then_transition_is_rejected() {
    let mut document = Document::new(ProjectId::new(), "a.pdf".into(), "application/pdf".into(), 3);

    assert!(document.transition_to(DocumentStatus::Processed).is_err());
    assert!(document.transition_to(DocumentStatus::Failed).is_err());
    assert_eq!(document.status, DocumentStatus::Uploaded);
}

#[test]
fn given_failed_document_when_reprocessing_then_status_returns_to_processing() {
    let mut document = Document::new(ProjectId::new(), "a.pdf".into(), "application/pdf".into(), 3);
    document.transition_to(DocumentStatus::Processing).unwrap();
    document.transition_to(DocumentStatus::Failed).unwrap();
    assert!(document.status.is_terminal());

    document.begin_reprocessing();

    assert_eq!(document.status, DocumentStatus::Processing);
    document.transition_to(DocumentStatus::Processed).unwrap();
}

#[test]
fn given_status_strings_when_parsed_then_round_trip_through_display() {
    for status in [
        DocumentStatus::Uploaded,
        DocumentStatus::Processing,
        DocumentStatus::Processed,
        DocumentStatus::Failed,
    ] {
        assert_eq!(status.to_string().parse::<DocumentStatus>().unwrap(), status);
    }
    assert!("done".parse::<DocumentStatus>().is_err());
}

#[test]
fn given_unsafe_file_name_when_building_storage_key_then_segments_are_sanitized() {
    let project_id = ProjectId::new();
    let document_id = DocumentId::new();

    let key = StorageKey::for_upload(
        &CompanyId::new("acme corp"),
        &project_id,
        &document_id,
        1_700_000_000_000,
        "../site plan (v2).pdf",
    );

    assert_eq!(
        key.as_str(),
        format!("acme_corp/{project_id}/files/{document_id}_1700000000000_.._site_plan__v2_.pdf")
    );
    assert_eq!(key.as_str().matches('/').count(), 3);
}

#[test]
fn given_declared_mime_when_detecting_media_type_then_mime_wins_over_extension() {
    assert_eq!(MediaType::detect("application/pdf", "notes.txt"), MediaType::Pdf);
    assert_eq!(MediaType::detect("text/plain; charset=utf-8", "x.pdf"), MediaType::PlainText);
    assert_eq!(MediaType::detect("image/png", "scan"), MediaType::Image);
    assert_eq!(MediaType::detect("application/msword", "notes.doc"), MediaType::LegacyDoc);
}

#[test]
fn given_generic_mime_when_detecting_media_type_then_extension_is_consulted() {
    assert_eq!(
        MediaType::detect("application/octet-stream", "Report.DOCX"),
        MediaType::Docx
    );
    assert_eq!(MediaType::detect("", "photo.jpeg"), MediaType::Image);
    assert_eq!(MediaType::detect("application/zip", "archive.pdf"), MediaType::Unknown);
}

#[test]
fn given_document_id_when_deriving_vector_id_then_only_index_safe_characters_remain() {
    let id = DocumentId::new();
    assert_eq!(VectorId::for_document(&id).as_str(), id.to_string());
    assert_eq!(VectorId::sanitize("a b/c.d").as_str(), "a_b_c_d");
    assert_eq!(VectorId::sanitize("").as_str(), "_");
}

#[test]
fn given_project_id_when_deriving_namespace_then_namespace_is_the_id() {
    let id = ProjectId::new();
    assert_eq!(Namespace::for_project(&id).as_str(), id.to_string());
}

#[test]
fn given_ttl_when_signing_url_then_expiry_is_issue_time_plus_ttl() {
    let issued = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    let signed = SignedUrl::new("https://x".into(), issued, Duration::from_secs(3600));

    assert_eq!(signed.expires_at, issued + chrono::Duration::hours(1));
    assert!(!signed.is_expired(issued + chrono::Duration::minutes(59)));
    assert!(signed.is_expired(issued + chrono::Duration::hours(1)));
}

#[test]
fn given_explicit_slug_when_creating_project_then_it_is_normalized() {
    let project = Project::new(
        CompanyId::new("acme"),
        "Harbor Bridge".into(),
        None,
        Some("Bridge 2024".into()),
    );
    assert_eq!(project.slug, "bridge-2024");

    let fallback = Project::new(CompanyId::new("acme"), "Harbor Bridge".into(), None, Some("!!".into()));
    assert_eq!(fallback.slug, "harbor-bridge");
}

#[test]
fn given_renamed_project_when_matching_slug_then_both_stored_and_derived_slugs_match() {
    let mut project = Project::new(CompanyId::new("acme"), "Old Name".into(), None, None);
    project.name = "New Name".into();

    assert!(project.matches_slug("old-name"));
    assert!(project.matches_slug("new-name"));
    assert!(!project.matches_slug("other"));
}

#[test]
fn given_document_with_signed_url_when_snapshotting_then_url_is_dropped() {
    let mut document = Document::new(ProjectId::new(), "a.pdf".into(), "application/pdf".into(), 3);
    document.signed_url = Some(SignedUrl::new("https://x".into(), Utc::now(), Duration::from_secs(60)));

    let snapshot = document.without_signed_url();

    assert!(snapshot.signed_url.is_none());
    assert_eq!(snapshot.id, document.id);
}

#[test]
fn given_parallel_vectors_when_comparing_then_similarity_is_one() {
    let a = Embedding::new(vec![1.0, 2.0, 3.0]);
    let b = Embedding::new(vec![2.0, 4.0, 6.0]);

    assert!((a.cosine_similarity(&b) - 1.0).abs() < 1e-6);
    assert!((b.normalized().magnitude() - 1.0).abs() < 1e-6);
    assert_eq!(a.cosine_similarity(&Embedding::new(vec![1.0])), 0.0);
}

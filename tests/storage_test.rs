use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::{TimeZone, Utc};
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;

use scopeiq::application::ports::{BlobStore, BlobStoreError, MetadataMirror, UrlSigner};
use scopeiq::domain::{CompanyId, Document, Project, ProjectId, StorageKey};
use scopeiq::infrastructure::storage::{
    BlobMetadataMirror, BlobStoreFactory, LocalUrlSigner, ObjectBlobStore, UrlVerificationError,
};
use scopeiq::presentation::config::{StorageProviderSetting, StorageSettings};

fn signer() -> Arc<LocalUrlSigner> {
    Arc::new(LocalUrlSigner::new("http://files.test/", "secret"))
}

fn query_param(url: &str, name: &str) -> String {
    reqwest::Url::parse(url)
        .unwrap()
        .query_pairs()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
        .unwrap()
}

#[tokio::test]
async fn given_local_filesystem_when_storing_blob_then_it_can_be_fetched_and_deleted() {
    let dir = tempfile::tempdir().unwrap();
    let fs = LocalFileSystem::new_with_prefix(dir.path()).unwrap();
    let store = ObjectBlobStore::new(Arc::new(fs), signer() as Arc<dyn UrlSigner>);
    let key = StorageKey::from_raw("acme/p1/files/d1_1_plan.pdf");

    let size = store.put(&key, Bytes::from_static(b"drawing")).await.unwrap();
    assert_eq!(size, 7);
    assert_eq!(store.size(&key).await.unwrap(), 7);
    assert_eq!(store.fetch(&key).await.unwrap().as_ref(), b"drawing");

    store.delete(&key).await.unwrap();
    assert!(matches!(store.fetch(&key).await, Err(BlobStoreError::NotFound(_))));
    store.delete(&key).await.unwrap();
}

#[tokio::test]
async fn given_stored_blob_when_signing_then_url_expires_after_ttl() {
    let store = ObjectBlobStore::new(Arc::new(InMemory::new()), signer() as Arc<dyn UrlSigner>);
    let key = StorageKey::from_raw("acme/p1/files/a b.txt");

    let signed = store.signed_url(&key, Duration::from_secs(600)).await.unwrap();

    assert_eq!(signed.expires_at - signed.issued_at, chrono::Duration::seconds(600));
    assert!(signed.url.starts_with("http://files.test/files/acme/p1/files/a%20b.txt?"));
}

#[test]
fn given_signed_url_when_verifying_then_untampered_link_is_accepted() {
    let signer = signer();
    let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
    let key = StorageKey::from_raw("acme/p1/files/doc.pdf");

    let url = signer.sign_at(&key, Duration::from_secs(60), now).unwrap();
    let expires: i64 = query_param(&url, "expires").parse().unwrap();
    let nonce = query_param(&url, "nonce");
    let signature = query_param(&url, "signature");

    assert_eq!(expires, now.timestamp() + 60);
    assert_eq!(
        signer.verify(key.as_str(), expires, &nonce, &signature, now),
        Ok(())
    );
    assert_eq!(
        signer.verify("acme/p1/files/other.pdf", expires, &nonce, &signature, now),
        Err(UrlVerificationError::InvalidSignature)
    );
    assert_eq!(
        signer.verify(key.as_str(), expires + 3600, &nonce, &signature, now),
        Err(UrlVerificationError::InvalidSignature)
    );
    assert_eq!(
        signer.verify(key.as_str(), expires, &nonce, "zz", now),
        Err(UrlVerificationError::InvalidSignature)
    );
}

#[test]
fn given_same_instant_when_signing_twice_then_urls_differ_and_both_verify() {
    let signer = signer();
    let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
    let key = StorageKey::from_raw("acme/p1/files/doc.pdf");

    let first = signer.sign_at(&key, Duration::from_secs(60), now).unwrap();
    let second = signer.sign_at(&key, Duration::from_secs(60), now).unwrap();

    assert_ne!(first, second);
    for url in [&first, &second] {
        assert_eq!(
            signer.verify(
                key.as_str(),
                query_param(url, "expires").parse().unwrap(),
                &query_param(url, "nonce"),
                &query_param(url, "signature"),
                now,
            ),
            Ok(())
        );
    }
}

#[test]
fn given_signed_url_when_verifying_after_expiry_then_link_is_expired() {
    let signer = signer();
    let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
    let key = StorageKey::from_raw("acme/p1/files/doc.pdf");
    let url = signer.sign_at(&key, Duration::from_secs(60), now).unwrap();
    let expires: i64 = query_param(&url, "expires").parse().unwrap();

    let later = now + chrono::Duration::seconds(61);

    assert_eq!(
        signer.verify(
            key.as_str(),
            expires,
            &query_param(&url, "nonce"),
            &query_param(&url, "signature"),
            later
        ),
        Err(UrlVerificationError::Expired)
    );
}

#[test]
fn given_other_secret_when_verifying_then_signature_is_rejected() {
    let now = Utc::now();
    let key = StorageKey::from_raw("k");
    let url = signer().sign_at(&key, Duration::from_secs(60), now).unwrap();
    let other = LocalUrlSigner::new("http://files.test", "different");

    assert_eq!(
        other.verify(
            "k",
            query_param(&url, "expires").parse().unwrap(),
            &query_param(&url, "nonce"),
            &query_param(&url, "signature"),
            now
        ),
        Err(UrlVerificationError::InvalidSignature)
    );
}

#[tokio::test]
async fn given_mirror_when_writing_snapshots_then_they_read_back_and_delete_cleanly() {
    let mirror = BlobMetadataMirror::new(Arc::new(InMemory::new()), "/metadata/");
    let project = Project::new(CompanyId::new("acme"), "Site A".into(), None, None);
    let document = Document::new(project.id, "plan.pdf".into(), "application/pdf".into(), 10);

    mirror.put_project(&project).await.unwrap();
    mirror.put_document(&document).await.unwrap();

    assert_eq!(mirror.get_project(project.id).await.unwrap(), Some(project.clone()));
    assert_eq!(
        mirror.get_document(project.id, document.id).await.unwrap(),
        Some(document.clone())
    );

    mirror.delete_document(project.id, document.id).await.unwrap();
    mirror.delete_project(project.id).await.unwrap();
    mirror.delete_project(project.id).await.unwrap();
    assert!(mirror.get_project(project.id).await.unwrap().is_none());
    assert!(
        mirror
            .get_document(ProjectId::new(), document.id)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn given_memory_provider_when_building_backend_then_downloads_are_self_served() {
    let settings = StorageSettings {
        provider: StorageProviderSetting::Memory,
        signing_secret: "s3cret".into(),
        public_base_url: "http://api.test".into(),
        ..Default::default()
    };

    let backend = BlobStoreFactory::create(&settings).unwrap();
    let key = StorageKey::from_raw("acme/x.txt");
    backend.blob_store.put(&key, Bytes::from_static(b"x")).await.unwrap();
    let signed = backend
        .blob_store
        .signed_url(&key, Duration::from_secs(60))
        .await
        .unwrap();

    assert!(backend.local_signer.is_some());
    assert!(signed.url.starts_with("http://api.test/files/acme/x.txt?"));
}

#[tokio::test]
async fn given_local_provider_when_building_backend_then_directory_is_created() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("nested").join("blobs");
    let settings = StorageSettings {
        provider: StorageProviderSetting::Local,
        local_path: root.to_string_lossy().into_owned(),
        ..Default::default()
    };

    let backend = BlobStoreFactory::create(&settings).unwrap();

    assert!(root.is_dir());
    let key = StorageKey::from_raw("acme/p/files/a.txt");
    backend.blob_store.put(&key, Bytes::from_static(b"abc")).await.unwrap();
    assert_eq!(backend.blob_store.fetch(&key).await.unwrap().as_ref(), b"abc");
}

#[test]
fn given_azure_provider_without_account_when_building_backend_then_configuration_error() {
    let settings = StorageSettings {
        provider: StorageProviderSetting::Azure,
        ..Default::default()
    };

    assert!(matches!(
        BlobStoreFactory::create(&settings),
        Err(BlobStoreError::Configuration(_))
    ));
}

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::domain::{SignedUrl, StorageKey};

#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, key: &StorageKey, data: Bytes) -> Result<u64, BlobStoreError>;

    async fn fetch(&self, key: &StorageKey) -> Result<Bytes, BlobStoreError>;

    /// Deleting a missing key succeeds.
    async fn delete(&self, key: &StorageKey) -> Result<(), BlobStoreError>;

    /// Issues a fresh download URL. Redundant calls are harmless.
    ///
    /// Two calls always yield distinct URLs for the local and in-memory
    /// backends, which sign with a per-call nonce. Cloud presigners derive
    /// the URL from the signing time at second resolution, so two calls in
    /// the same second may return the same (equally valid) URL.
    async fn signed_url(&self, key: &StorageKey, ttl: Duration)
    -> Result<SignedUrl, BlobStoreError>;
}

/// Mints the capability-bearing part of a download URL.
#[async_trait]
pub trait UrlSigner: Send + Sync {
    async fn sign(&self, key: &StorageKey, ttl: Duration) -> Result<String, BlobStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum BlobStoreError {
    #[error("upload failed: {0}")]
    UploadFailed(String),
    #[error("object not found: {0}")]
    NotFound(String),
    #[error("download failed: {0}")]
    DownloadFailed(String),
    #[error("delete failed: {0}")]
    DeleteFailed(String),
    #[error("url signing failed: {0}")]
    SigningFailed(String),
    #[error("storage configuration invalid: {0}")]
    Configuration(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use object_store::path::Path as StorePath;
use object_store::{ObjectStore, PutPayload};
use tracing::instrument;

use crate::application::ports::{BlobStore, BlobStoreError, UrlSigner};
use crate::domain::{SignedUrl, StorageKey};

/// `BlobStore` over any `object_store` backend, with URL minting delegated to
/// a provider-specific signer.
pub struct ObjectBlobStore {
    inner: Arc<dyn ObjectStore>,
    signer: Arc<dyn UrlSigner>,
}

impl ObjectBlobStore {
    pub fn new(inner: Arc<dyn ObjectStore>, signer: Arc<dyn UrlSigner>) -> Self {
        Self { inner, signer }
    }

    pub async fn size(&self, key: &StorageKey) -> Result<u64, BlobStoreError> {
        let meta = self
            .inner
            .head(&StorePath::from(key.as_str()))
            .await
            .map_err(|e| match e {
                object_store::Error::NotFound { .. } => BlobStoreError::NotFound(key.to_string()),
                other => BlobStoreError::DownloadFailed(other.to_string()),
            })?;
        Ok(meta.size as u64)
    }
}

#[async_trait]
impl BlobStore for ObjectBlobStore {
    #[instrument(skip(self, data), fields(key = %key, bytes = data.len()))]
    async fn put(&self, key: &StorageKey, data: Bytes) -> Result<u64, BlobStoreError> {
        let size = data.len() as u64;
        self.inner
            .put(&StorePath::from(key.as_str()), PutPayload::from(data))
            .await
            .map_err(|e| BlobStoreError::UploadFailed(e.to_string()))?;
        Ok(size)
    }

    #[instrument(skip(self), fields(key = %key))]
    async fn fetch(&self, key: &StorageKey) -> Result<Bytes, BlobStoreError> {
        let result = self
            .inner
            .get(&StorePath::from(key.as_str()))
            .await
            .map_err(|e| match e {
                object_store::Error::NotFound { .. } => BlobStoreError::NotFound(key.to_string()),
                other => BlobStoreError::DownloadFailed(other.to_string()),
            })?;

        result
            .bytes()
            .await
            .map_err(|e| BlobStoreError::DownloadFailed(e.to_string()))
    }

    #[instrument(skip(self), fields(key = %key))]
    async fn delete(&self, key: &StorageKey) -> Result<(), BlobStoreError> {
        match self.inner.delete(&StorePath::from(key.as_str())).await {
            Ok(()) | Err(object_store::Error::NotFound { .. }) => Ok(()),
            Err(e) => Err(BlobStoreError::DeleteFailed(e.to_string())),
        }
    }

    async fn signed_url(
        &self,
        key: &StorageKey,
        ttl: Duration,
    ) -> Result<SignedUrl, BlobStoreError> {
        let issued_at = Utc::now();
        let url = self.signer.sign(key, ttl).await?;
        Ok(SignedUrl::new(url, issued_at, ttl))
    }
}

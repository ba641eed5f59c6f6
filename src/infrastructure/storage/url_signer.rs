use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use object_store::path::Path as StorePath;
use object_store::signer::Signer;
use reqwest::Url;
use sha2::Sha256;
use uuid::Uuid;

use crate::application::ports::{BlobStoreError, UrlSigner};
use crate::domain::StorageKey;

type HmacSha256 = Hmac<Sha256>;

/// Presigned URLs from the cloud provider (Azure SAS, S3 presign).
///
/// No nonce is added: S3 signs the full query string, so an extra parameter
/// would invalidate the URL. Calls within the same second can return
/// identical URLs.
pub struct CloudUrlSigner<S> {
    signer: Arc<S>,
}

impl<S: Signer> CloudUrlSigner<S> {
    pub fn new(signer: Arc<S>) -> Self {
        Self { signer }
    }
}

#[async_trait]
impl<S: Signer> UrlSigner for CloudUrlSigner<S> {
    async fn sign(&self, key: &StorageKey, ttl: Duration) -> Result<String, BlobStoreError> {
        self.signer
            .signed_url(reqwest::Method::GET, &StorePath::from(key.as_str()), ttl)
            .await
            .map(|url| url.to_string())
            .map_err(|e| BlobStoreError::SigningFailed(e.to_string()))
    }
}

/// HMAC-signed links served by this process's own `/files` route, used for
/// backends without native presigning. A random nonce makes every issued URL
/// distinct.
pub struct LocalUrlSigner {
    base_url: String,
    secret: Vec<u8>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum UrlVerificationError {
    #[error("signed url expired")]
    Expired,
    #[error("signed url signature invalid")]
    InvalidSignature,
}

impl LocalUrlSigner {
    pub fn new(base_url: impl Into<String>, secret: impl AsRef<[u8]>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            secret: secret.as_ref().to_vec(),
        }
    }

    fn mac(&self, key: &str, expires: i64, nonce: &str) -> Result<HmacSha256, BlobStoreError> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| BlobStoreError::Configuration(e.to_string()))?;
        mac.update(format!("{key}\n{expires}\n{nonce}").as_bytes());
        Ok(mac)
    }

    pub fn sign_at(
        &self,
        key: &StorageKey,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<String, BlobStoreError> {
        let ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        let expires = now.timestamp().saturating_add(ttl_secs);
        let nonce = Uuid::new_v4().simple().to_string();
        let signature = hex::encode(
            self.mac(key.as_str(), expires, &nonce)?
                .finalize()
                .into_bytes(),
        );

        let mut url = Url::parse(&self.base_url)
            .map_err(|e| BlobStoreError::Configuration(format!("invalid public base url: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| BlobStoreError::Configuration("public base url cannot be a base".into()))?
            .pop_if_empty()
            .push("files")
            .extend(key.as_str().split('/'));
        url.query_pairs_mut()
            .append_pair("expires", &expires.to_string())
            .append_pair("nonce", &nonce)
            .append_pair("signature", &signature);

        Ok(url.to_string())
    }

    pub fn verify(
        &self,
        key: &str,
        expires: i64,
        nonce: &str,
        signature: &str,
        now: DateTime<Utc>,
    ) -> Result<(), UrlVerificationError> {
        let provided = hex::decode(signature).map_err(|_| UrlVerificationError::InvalidSignature)?;
        self.mac(key, expires, nonce)
            .map_err(|_| UrlVerificationError::InvalidSignature)?
            .verify_slice(&provided)
            .map_err(|_| UrlVerificationError::InvalidSignature)?;

        if now.timestamp() >= expires {
            return Err(UrlVerificationError::Expired);
        }
        Ok(())
    }
}

#[async_trait]
impl UrlSigner for LocalUrlSigner {
    async fn sign(&self, key: &StorageKey, ttl: Duration) -> Result<String, BlobStoreError> {
        self.sign_at(key, ttl, Utc::now())
    }
}

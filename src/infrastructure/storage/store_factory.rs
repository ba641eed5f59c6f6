use std::path::PathBuf;
use std::sync::Arc;

use object_store::ObjectStore;
use object_store::aws::AmazonS3Builder;
use object_store::azure::MicrosoftAzureBuilder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use tokio::sync::OnceCell;

use crate::application::ports::{BlobStore, BlobStoreError, UrlSigner};
use crate::presentation::config::{StorageProviderSetting, StorageSettings};

use super::object_blob_store::ObjectBlobStore;
use super::url_signer::{CloudUrlSigner, LocalUrlSigner};

/// Everything built from one storage configuration. The raw object store is
/// shared with the metadata mirror; `local_signer` is set when downloads are
/// served by this process.
#[derive(Clone)]
pub struct StorageBackend {
    pub object_store: Arc<dyn ObjectStore>,
    pub blob_store: Arc<dyn BlobStore>,
    pub local_signer: Option<Arc<LocalUrlSigner>>,
}

static SHARED_BACKEND: OnceCell<StorageBackend> = OnceCell::const_new();

/// Process-wide storage backend, built from the first settings it sees.
pub async fn shared_object_store(
    settings: &StorageSettings,
) -> Result<StorageBackend, BlobStoreError> {
    SHARED_BACKEND
        .get_or_try_init(|| async { BlobStoreFactory::create(settings) })
        .await
        .cloned()
}

pub struct BlobStoreFactory;

impl BlobStoreFactory {
    pub fn create(settings: &StorageSettings) -> Result<StorageBackend, BlobStoreError> {
        match settings.provider {
            StorageProviderSetting::Local => {
                let path = PathBuf::from(&settings.local_path);
                std::fs::create_dir_all(&path)?;
                let fs = LocalFileSystem::new_with_prefix(path)
                    .map_err(|e| BlobStoreError::Configuration(e.to_string()))?;
                Ok(Self::self_served(Arc::new(fs), settings))
            }
            StorageProviderSetting::Memory => {
                Ok(Self::self_served(Arc::new(InMemory::new()), settings))
            }
            StorageProviderSetting::Azure => {
                let account = required(&settings.azure_account, "azure_account")?;
                let key = required(&settings.azure_access_key, "azure_access_key")?;
                let container = required(&settings.azure_container, "azure_container")?;
                let store = MicrosoftAzureBuilder::new()
                    .with_account(account)
                    .with_access_key(key)
                    .with_container_name(container)
                    .build()
                    .map_err(|e| BlobStoreError::Configuration(e.to_string()))?;
                tracing::info!(account, container, "Using Azure blob storage");
                Ok(Self::cloud(store))
            }
            StorageProviderSetting::S3 => {
                let bucket = required(&settings.s3_bucket, "s3_bucket")?;
                let mut builder = AmazonS3Builder::new().with_bucket_name(bucket);
                if let Some(region) = &settings.s3_region {
                    builder = builder.with_region(region);
                }
                if let Some(key_id) = &settings.s3_access_key_id {
                    builder = builder.with_access_key_id(key_id);
                }
                if let Some(secret) = &settings.s3_secret_access_key {
                    builder = builder.with_secret_access_key(secret);
                }
                if let Some(endpoint) = &settings.s3_endpoint {
                    builder = builder.with_endpoint(endpoint);
                }
                let store = builder
                    .build()
                    .map_err(|e| BlobStoreError::Configuration(e.to_string()))?;
                tracing::info!(bucket, "Using S3 blob storage");
                Ok(Self::cloud(store))
            }
        }
    }

    fn self_served(store: Arc<dyn ObjectStore>, settings: &StorageSettings) -> StorageBackend {
        let signer = Arc::new(LocalUrlSigner::new(
            settings.public_base_url.clone(),
            settings.signing_secret.as_bytes(),
        ));
        StorageBackend {
            blob_store: Arc::new(ObjectBlobStore::new(
                Arc::clone(&store),
                Arc::clone(&signer) as Arc<dyn UrlSigner>,
            )),
            object_store: store,
            local_signer: Some(signer),
        }
    }

    fn cloud<S>(store: S) -> StorageBackend
    where
        S: ObjectStore + object_store::signer::Signer,
    {
        let store = Arc::new(store);
        let object_store: Arc<dyn ObjectStore> = Arc::clone(&store) as Arc<dyn ObjectStore>;
        StorageBackend {
            blob_store: Arc::new(ObjectBlobStore::new(
                Arc::clone(&object_store),
                Arc::new(CloudUrlSigner::new(store)),
            )),
            object_store,
            local_signer: None,
        }
    }
}

fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, BlobStoreError> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| BlobStoreError::Configuration(format!("{name} required")))
}

mod blob_metadata_mirror;
mod object_blob_store;
mod store_factory;
mod url_signer;

pub use blob_metadata_mirror::BlobMetadataMirror;
pub use object_blob_store::ObjectBlobStore;
pub use store_factory::{BlobStoreFactory, StorageBackend, shared_object_store};
pub use url_signer::{CloudUrlSigner, LocalUrlSigner, UrlVerificationError};

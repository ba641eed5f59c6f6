use std::sync::Arc;

use crate::application::ports::BlobStore;
use crate::application::services::SyncFacade;
use crate::infrastructure::storage::LocalUrlSigner;

#[derive(Clone)]
pub struct AppState {
    pub facade: Arc<SyncFacade>,
    pub blob_store: Arc<dyn BlobStore>,
    /// Set when this process serves its own signed download links.
    pub local_signer: Option<Arc<LocalUrlSigner>>,
}

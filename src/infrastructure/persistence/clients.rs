use std::sync::Arc;

use qdrant_client::Qdrant;
use tokio::sync::OnceCell;

use crate::application::ports::VectorIndexError;

static QDRANT_CLIENT: OnceCell<Arc<Qdrant>> = OnceCell::const_new();

/// Process-wide Qdrant client, built on first use. Later calls return the
/// same client regardless of `url`.
pub async fn shared_qdrant_client(url: &str) -> Result<Arc<Qdrant>, VectorIndexError> {
    QDRANT_CLIENT
        .get_or_try_init(|| async {
            tracing::info!(url = %url, "Initializing Qdrant client");
            Qdrant::from_url(url)
                .build()
                .map(Arc::new)
                .map_err(|e| VectorIndexError::ConnectionFailed(e.to_string()))
        })
        .await
        .cloned()
}

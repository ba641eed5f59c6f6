#[derive(Debug, thiserror::Error)]
pub enum VectorIndexError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
    #[error("namespace creation failed: {0}")]
    NamespaceCreationFailed(String),
    #[error("namespace deletion failed: {0}")]
    NamespaceDeletionFailed(String),
    #[error("payload index creation failed: {0}")]
    PayloadIndexFailed(String),
    #[error("upsert failed: {0}")]
    UpsertFailed(String),
    #[error("query failed: {0}")]
    QueryFailed(String),
    #[error("delete failed: {0}")]
    DeleteFailed(String),
}

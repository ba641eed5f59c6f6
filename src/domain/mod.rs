mod document;
mod document_status;
mod embedding;
mod embedding_record;
mod project;
mod signed_url;
mod slug;
mod storage_key;

pub use document::{Document, DocumentId, MediaType};
pub use document_status::{DocumentStatus, DocumentStatusError};
pub use embedding::Embedding;
pub use embedding_record::{EmbeddingRecord, Namespace, VectorId};
pub use project::{CompanyId, Project, ProjectId};
pub use signed_url::SignedUrl;
pub use slug::slugify;
pub use storage_key::{StorageKey, sanitize_segment};

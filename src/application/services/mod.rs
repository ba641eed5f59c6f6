mod background_queue;
mod best_effort;
mod document_processor;
mod embedding_service;
mod mirror_sync;
mod status_writer;
mod sync_facade;
mod text_extraction;
mod token_counter;

pub use background_queue::{BackgroundQueue, BackgroundWorker, JobTicket, QueueError};
pub use best_effort::spawn_best_effort;
pub use document_processor::{
    DocumentJob, DocumentProcessor, JobMetadata, JobTrigger, ProcessingError,
};
pub use embedding_service::{
    CONTENT_KEY, DOCUMENT_ID_KEY, EmbeddingService, EmbeddingServiceError, PROJECT_ID_KEY,
    SearchHit,
};
pub use mirror_sync::MirrorSync;
pub use status_writer::{StatusWriteError, StatusWriter};
pub use sync_facade::{
    DocumentUpdate, NewDocument, NewProject, ProjectUpdate, SyncError, SyncFacade,
};
pub use text_extraction::TextExtractionService;
pub use token_counter::{count_tokens, truncate_to_tokens};

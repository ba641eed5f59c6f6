use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::Instrument;

use crate::application::services::{
    DocumentJob, DocumentProcessor, JobMetadata, JobTrigger, ProcessingError,
};
use crate::domain::{CompanyId, DocumentId, ProjectId, StorageKey};

struct QueuedJob {
    job: DocumentJob,
    not_before: Instant,
    completion: oneshot::Sender<Result<(), ProcessingError>>,
}

/// In-process work queue. Jobs start in enqueue order after a fixed minimum
/// delay and run concurrently once started.
///
/// Delivery is at-most-once and nothing survives a restart: a job still in
/// the channel when the process exits is lost, and a failed job is not
/// retried. Deployments that need at-least-once processing must put a
/// durable queue behind `enqueue`.
#[derive(Clone)]
pub struct BackgroundQueue {
    sender: mpsc::Sender<QueuedJob>,
    min_delay: Duration,
}

impl BackgroundQueue {
    pub fn new(
        processor: Arc<DocumentProcessor>,
        capacity: usize,
        min_delay: Duration,
    ) -> (Self, BackgroundWorker) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (
            Self { sender, min_delay },
            BackgroundWorker {
                receiver,
                processor,
            },
        )
    }

    /// Queues the first processing run of an upload. Returns immediately;
    /// the ticket may be dropped and the job still runs.
    pub fn enqueue(
        &self,
        company_id: CompanyId,
        project_id: ProjectId,
        document_id: DocumentId,
        storage_key: StorageKey,
        metadata: JobMetadata,
    ) -> Result<JobTicket, QueueError> {
        self.submit(DocumentJob {
            company_id,
            project_id,
            document_id,
            storage_key,
            metadata,
            trigger: JobTrigger::Upload,
        })
    }

    /// Queues a manual rerun. The job takes over from whatever state the
    /// document is in when it starts.
    pub fn enqueue_reprocess(
        &self,
        company_id: CompanyId,
        project_id: ProjectId,
        document_id: DocumentId,
        storage_key: StorageKey,
        metadata: JobMetadata,
    ) -> Result<JobTicket, QueueError> {
        self.submit(DocumentJob {
            company_id,
            project_id,
            document_id,
            storage_key,
            metadata,
            trigger: JobTrigger::Reprocess,
        })
    }

    fn submit(&self, job: DocumentJob) -> Result<JobTicket, QueueError> {
        let document_id = job.document_id;
        let trigger = job.trigger;
        let (completion, receiver) = oneshot::channel();
        let queued = QueuedJob {
            job,
            not_before: Instant::now() + self.min_delay,
            completion,
        };

        self.sender.try_send(queued).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => QueueError::Full,
            mpsc::error::TrySendError::Closed(_) => QueueError::Closed,
        })?;

        tracing::info!(
            document_id = %document_id,
            trigger = ?trigger,
            "Document processing job enqueued"
        );
        Ok(JobTicket {
            document_id,
            receiver,
        })
    }
}

pub struct BackgroundWorker {
    receiver: mpsc::Receiver<QueuedJob>,
    processor: Arc<DocumentProcessor>,
}

impl BackgroundWorker {
    pub async fn run(mut self) {
        tracing::info!("Background worker started");
        while let Some(queued) = self.receiver.recv().await {
            tokio::time::sleep_until(queued.not_before).await;

            let processor = Arc::clone(&self.processor);
            let span = tracing::info_span!(
                "document_job",
                company_id = %queued.job.company_id,
                project_id = %queued.job.project_id,
                document_id = %queued.job.document_id,
                file_name = %queued.job.metadata.file_name,
            );

            tokio::spawn(
                async move {
                    let result = processor.process(&queued.job).await;
                    if let Err(e) = &result {
                        tracing::error!(error = %e, "Document processing job failed");
                    }
                    // Nobody listening is fine.
                    let _ = queued.completion.send(result);
                }
                .instrument(span),
            );
        }
        tracing::info!("Background worker stopped: channel closed");
    }
}

/// Handle on the outcome of one enqueued job.
pub struct JobTicket {
    document_id: DocumentId,
    receiver: oneshot::Receiver<Result<(), ProcessingError>>,
}

impl JobTicket {
    pub fn document_id(&self) -> DocumentId {
        self.document_id
    }

    pub async fn wait(self) -> Result<(), ProcessingError> {
        self.receiver.await.unwrap_or(Err(ProcessingError::Abandoned))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("background queue is full")]
    Full,
    #[error("background worker is not running")]
    Closed,
}

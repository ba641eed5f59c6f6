use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::Instrument;

use crate::application::ports::{MetadataMirror, MirrorError};
use crate::domain::{Document, DocumentId, Project, ProjectId};

enum MirrorWrite {
    PutProject(Project),
    DeleteProject(ProjectId),
    PutDocument(Document),
    DeleteDocument(ProjectId, DocumentId),
}

impl MirrorWrite {
    fn operation(&self) -> &'static str {
        match self {
            Self::PutProject(_) => "mirror_put_project",
            Self::DeleteProject(_) => "mirror_delete_project",
            Self::PutDocument(_) => "mirror_put_document",
            Self::DeleteDocument(..) => "mirror_delete_document",
        }
    }

    async fn apply(self, mirror: &dyn MetadataMirror) -> Result<(), MirrorError> {
        match self {
            Self::PutProject(project) => mirror.put_project(&project).await,
            Self::DeleteProject(id) => mirror.delete_project(id).await,
            Self::PutDocument(document) => mirror.put_document(&document).await,
            Self::DeleteDocument(project_id, id) => mirror.delete_document(project_id, id).await,
        }
    }
}

/// Fire-and-forget replication into the legacy mirror. Every call returns
/// immediately. Writes are applied one at a time in submission order by a
/// single replication task, so a later snapshot is never overwritten by an
/// earlier one.
#[derive(Clone, Default)]
pub struct MirrorSync {
    sender: Option<mpsc::UnboundedSender<MirrorWrite>>,
}

impl MirrorSync {
    /// Spawns the replication task, so it must be called inside a Tokio
    /// runtime. The task ends once every clone has been dropped.
    pub fn new(mirror: Arc<dyn MetadataMirror>) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        tokio::spawn(replicate(mirror, receiver).instrument(tracing::debug_span!("mirror_sync")));
        Self {
            sender: Some(sender),
        }
    }

    pub fn disabled() -> Self {
        Self { sender: None }
    }

    pub fn project_saved(&self, project: &Project) {
        self.submit(MirrorWrite::PutProject(project.clone()));
    }

    pub fn project_deleted(&self, id: ProjectId) {
        self.submit(MirrorWrite::DeleteProject(id));
    }

    pub fn document_saved(&self, document: &Document) {
        self.submit(MirrorWrite::PutDocument(document.without_signed_url()));
    }

    pub fn document_deleted(&self, project_id: ProjectId, id: DocumentId) {
        self.submit(MirrorWrite::DeleteDocument(project_id, id));
    }

    fn submit(&self, write: MirrorWrite) {
        let Some(sender) = &self.sender else {
            return;
        };
        let operation = write.operation();
        if sender.send(write).is_err() {
            tracing::warn!(operation, "Mirror replication stopped, write dropped");
        }
    }
}

async fn replicate(
    mirror: Arc<dyn MetadataMirror>,
    mut receiver: mpsc::UnboundedReceiver<MirrorWrite>,
) {
    while let Some(write) = receiver.recv().await {
        let operation = write.operation();
        match write.apply(mirror.as_ref()).await {
            Ok(()) => tracing::debug!(operation, "Mirror write applied"),
            Err(e) => tracing::warn!(operation, error = %e, "Mirror write failed"),
        }
    }
    tracing::debug!("Mirror replication stopped: all senders dropped");
}

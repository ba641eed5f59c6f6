use std::sync::Arc;

use async_trait::async_trait;
use object_store::path::Path as StorePath;
use object_store::{ObjectStore, PutPayload};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::instrument;

use crate::application::ports::{MetadataMirror, MirrorError};
use crate::domain::{Document, DocumentId, Project, ProjectId};

/// JSON snapshots laid out the way the pre-database version stored them:
/// `{prefix}/projects/{id}.json` and `{prefix}/documents/{project}/{id}.json`.
pub struct BlobMetadataMirror {
    store: Arc<dyn ObjectStore>,
    prefix: String,
}

impl BlobMetadataMirror {
    pub fn new(store: Arc<dyn ObjectStore>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into().trim_matches('/').to_string(),
        }
    }

    fn project_path(&self, id: ProjectId) -> StorePath {
        StorePath::from(format!("{}/projects/{}.json", self.prefix, id))
    }

    fn document_path(&self, project_id: ProjectId, id: DocumentId) -> StorePath {
        StorePath::from(format!(
            "{}/documents/{}/{}.json",
            self.prefix, project_id, id
        ))
    }

    async fn write<T: Serialize + Sync>(
        &self,
        path: &StorePath,
        value: &T,
    ) -> Result<(), MirrorError> {
        let body = serde_json::to_vec(value)?;
        self.store
            .put(path, PutPayload::from(body))
            .await
            .map_err(|e| MirrorError::WriteFailed(e.to_string()))?;
        Ok(())
    }

    async fn read<T: DeserializeOwned>(&self, path: &StorePath) -> Result<Option<T>, MirrorError> {
        let result = match self.store.get(path).await {
            Ok(result) => result,
            Err(object_store::Error::NotFound { .. }) => return Ok(None),
            Err(e) => return Err(MirrorError::ReadFailed(e.to_string())),
        };
        let bytes = result
            .bytes()
            .await
            .map_err(|e| MirrorError::ReadFailed(e.to_string()))?;
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    async fn remove(&self, path: &StorePath) -> Result<(), MirrorError> {
        match self.store.delete(path).await {
            Ok(()) | Err(object_store::Error::NotFound { .. }) => Ok(()),
            Err(e) => Err(MirrorError::DeleteFailed(e.to_string())),
        }
    }
}

#[async_trait]
impl MetadataMirror for BlobMetadataMirror {
    #[instrument(skip(self, project), fields(project_id = %project.id))]
    async fn put_project(&self, project: &Project) -> Result<(), MirrorError> {
        self.write(&self.project_path(project.id), project).await
    }

    #[instrument(skip(self), fields(project_id = %id))]
    async fn delete_project(&self, id: ProjectId) -> Result<(), MirrorError> {
        self.remove(&self.project_path(id)).await
    }

    async fn get_project(&self, id: ProjectId) -> Result<Option<Project>, MirrorError> {
        self.read(&self.project_path(id)).await
    }

    #[instrument(skip(self, document), fields(document_id = %document.id))]
    async fn put_document(&self, document: &Document) -> Result<(), MirrorError> {
        let snapshot = document.without_signed_url();
        self.write(
            &self.document_path(document.project_id, document.id),
            &snapshot,
        )
        .await
    }

    #[instrument(skip(self), fields(document_id = %id))]
    async fn delete_document(
        &self,
        project_id: ProjectId,
        id: DocumentId,
    ) -> Result<(), MirrorError> {
        self.remove(&self.document_path(project_id, id)).await
    }

    async fn get_document(
        &self,
        project_id: ProjectId,
        id: DocumentId,
    ) -> Result<Option<Document>, MirrorError> {
        self.read(&self.document_path(project_id, id)).await
    }
}

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::application::ports::{MetadataStore, RepositoryError};
use crate::domain::{Document, DocumentId, DocumentStatus, Project, ProjectId, SignedUrl};

/// Process-local metadata store for development and tests. Mirrors the
/// Postgres store's semantics, including the project cascade.
#[derive(Default)]
pub struct InMemoryMetadataStore {
    projects: RwLock<HashMap<ProjectId, Project>>,
    documents: RwLock<HashMap<DocumentId, Document>>,
}

impl InMemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first<T>(mut items: Vec<T>, created_at: impl Fn(&T) -> chrono::DateTime<Utc>) -> Vec<T> {
    items.sort_by_key(|item| std::cmp::Reverse(created_at(item)));
    items
}

#[async_trait]
impl MetadataStore for InMemoryMetadataStore {
    async fn insert_project(&self, project: &Project) -> Result<(), RepositoryError> {
        let mut projects = self.projects.write().await;
        if projects.contains_key(&project.id) {
            return Err(RepositoryError::ConstraintViolation(format!(
                "project {} already exists",
                project.id
            )));
        }
        projects.insert(project.id, project.clone());
        Ok(())
    }

    async fn update_project(&self, project: &Project) -> Result<(), RepositoryError> {
        let mut projects = self.projects.write().await;
        match projects.get_mut(&project.id) {
            Some(existing) => {
                *existing = project.clone();
                Ok(())
            }
            None => Err(RepositoryError::NotFound(project.id.to_string())),
        }
    }

    async fn delete_project(
        &self,
        id: ProjectId,
    ) -> Result<Option<(Project, Vec<Document>)>, RepositoryError> {
        let mut projects = self.projects.write().await;
        let mut documents = self.documents.write().await;

        let Some(project) = projects.remove(&id) else {
            return Ok(None);
        };

        let owned: Vec<DocumentId> = documents
            .values()
            .filter(|d| d.project_id == id)
            .map(|d| d.id)
            .collect();
        let removed = owned
            .into_iter()
            .filter_map(|doc_id| documents.remove(&doc_id))
            .collect();

        Ok(Some((project, removed)))
    }

    async fn get_project(&self, id: ProjectId) -> Result<Option<Project>, RepositoryError> {
        Ok(self.projects.read().await.get(&id).cloned())
    }

    async fn list_projects(&self) -> Result<Vec<Project>, RepositoryError> {
        let projects = self.projects.read().await.values().cloned().collect();
        Ok(newest_first(projects, |p| p.created_at))
    }

    async fn insert_document(&self, document: &Document) -> Result<(), RepositoryError> {
        if !self.projects.read().await.contains_key(&document.project_id) {
            return Err(RepositoryError::ConstraintViolation(format!(
                "project {} does not exist",
                document.project_id
            )));
        }

        let mut documents = self.documents.write().await;
        if documents.contains_key(&document.id) {
            return Err(RepositoryError::ConstraintViolation(format!(
                "document {} already exists",
                document.id
            )));
        }
        documents.insert(document.id, document.without_signed_url());
        Ok(())
    }

    async fn update_document(&self, document: &Document) -> Result<(), RepositoryError> {
        let mut documents = self.documents.write().await;
        let existing = documents
            .get_mut(&document.id)
            .ok_or_else(|| RepositoryError::NotFound(document.id.to_string()))?;

        existing.name = document.name.clone();
        existing.thumbnail_key = document.thumbnail_key.clone();
        existing.extracted_content = document.extracted_content.clone();
        existing.updated_at = document.updated_at;
        Ok(())
    }

    async fn update_document_status(
        &self,
        id: DocumentId,
        status: DocumentStatus,
        extracted_content: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let mut documents = self.documents.write().await;
        let existing = documents
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;

        existing.status = status;
        if let Some(content) = extracted_content {
            existing.extracted_content = Some(content.to_string());
        }
        existing.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_document(&self, id: DocumentId) -> Result<Option<Document>, RepositoryError> {
        Ok(self.documents.write().await.remove(&id))
    }

    async fn get_document(&self, id: DocumentId) -> Result<Option<Document>, RepositoryError> {
        Ok(self.documents.read().await.get(&id).cloned())
    }

    async fn list_documents_by_project(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<Document>, RepositoryError> {
        let documents = self
            .documents
            .read()
            .await
            .values()
            .filter(|d| d.project_id == project_id)
            .cloned()
            .collect();
        Ok(newest_first(documents, |d| d.created_at))
    }

    async fn list_documents(&self) -> Result<Vec<Document>, RepositoryError> {
        let documents = self.documents.read().await.values().cloned().collect();
        Ok(newest_first(documents, |d| d.created_at))
    }

    async fn store_signed_url(
        &self,
        id: DocumentId,
        signed_url: &SignedUrl,
    ) -> Result<(), RepositoryError> {
        if let Some(existing) = self.documents.write().await.get_mut(&id) {
            existing.signed_url = Some(signed_url.clone());
        }
        Ok(())
    }
}

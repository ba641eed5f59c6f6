use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;

use crate::application::ports::{MetadataStore, RepositoryError};
use crate::domain::{
    CompanyId, Document, DocumentId, DocumentStatus, Project, ProjectId, SignedUrl, StorageKey,
};

const PROJECT_COLUMNS: &str = "id, name, description, slug, company_id, created_at, updated_at";

const DOCUMENT_COLUMNS: &str = "id, project_id, name, mime_type, size, status, storage_key, \
     thumbnail_key, extracted_content, signed_url, signed_url_issued_at, signed_url_expires_at, \
     created_at, updated_at";

pub struct PgMetadataStore {
    pool: PgPool,
}

impl PgMetadataStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn query_error(e: sqlx::Error) -> RepositoryError {
    if let Some(db) = e.as_database_error() {
        if db.is_unique_violation() || db.is_foreign_key_violation() || db.is_check_violation() {
            return RepositoryError::ConstraintViolation(db.message().to_string());
        }
    }
    RepositoryError::QueryFailed(e.to_string())
}

fn column<'r, T>(row: &'r PgRow, name: &str) -> Result<T, RepositoryError>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(name)
        .map_err(|e| RepositoryError::MalformedRow(format!("{name}: {e}")))
}

fn project_from_row(row: &PgRow) -> Result<Project, RepositoryError> {
    Ok(Project {
        id: ProjectId::from_uuid(column(row, "id")?),
        name: column(row, "name")?,
        description: column(row, "description")?,
        slug: column(row, "slug")?,
        company_id: CompanyId::new(column::<String>(row, "company_id")?),
        created_at: column(row, "created_at")?,
        updated_at: column(row, "updated_at")?,
    })
}

fn document_from_row(row: &PgRow) -> Result<Document, RepositoryError> {
    let status = column::<String>(row, "status")?
        .parse::<DocumentStatus>()
        .map_err(RepositoryError::MalformedRow)?;
    let size: i64 = column(row, "size")?;

    let signed_url = match (
        column::<Option<String>>(row, "signed_url")?,
        column::<Option<DateTime<Utc>>>(row, "signed_url_issued_at")?,
        column::<Option<DateTime<Utc>>>(row, "signed_url_expires_at")?,
    ) {
        (Some(url), Some(issued_at), Some(expires_at)) => Some(SignedUrl {
            url,
            issued_at,
            expires_at,
        }),
        _ => None,
    };

    Ok(Document {
        id: DocumentId::from_uuid(column(row, "id")?),
        project_id: ProjectId::from_uuid(column(row, "project_id")?),
        name: column(row, "name")?,
        mime_type: column(row, "mime_type")?,
        size: u64::try_from(size).unwrap_or_default(),
        status,
        storage_key: column::<Option<String>>(row, "storage_key")?.map(StorageKey::from_raw),
        thumbnail_key: column::<Option<String>>(row, "thumbnail_key")?.map(StorageKey::from_raw),
        extracted_content: column(row, "extracted_content")?,
        signed_url,
        created_at: column(row, "created_at")?,
        updated_at: column(row, "updated_at")?,
    })
}

fn size_column(size: u64) -> i64 {
    i64::try_from(size).unwrap_or(i64::MAX)
}

#[async_trait]
impl MetadataStore for PgMetadataStore {
    #[instrument(skip(self, project), fields(project_id = %project.id))]
    async fn insert_project(&self, project: &Project) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO projects (id, name, description, slug, company_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(project.id.as_uuid())
        .bind(&project.name)
        .bind(&project.description)
        .bind(&project.slug)
        .bind(project.company_id.as_str())
        .bind(project.created_at)
        .bind(project.updated_at)
        .execute(&self.pool)
        .await
        .map_err(query_error)?;

        Ok(())
    }

    #[instrument(skip(self, project), fields(project_id = %project.id))]
    async fn update_project(&self, project: &Project) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE projects
            SET name = $1, description = $2, slug = $3, updated_at = $4
            WHERE id = $5
            "#,
        )
        .bind(&project.name)
        .bind(&project.description)
        .bind(&project.slug)
        .bind(project.updated_at)
        .bind(project.id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(query_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(project.id.to_string()));
        }
        Ok(())
    }

    #[instrument(skip(self), fields(project_id = %id))]
    async fn delete_project(
        &self,
        id: ProjectId,
    ) -> Result<Option<(Project, Vec<Document>)>, RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(query_error)?;

        let Some(project_row) = sqlx::query(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1 FOR UPDATE"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(query_error)?
        else {
            return Ok(None);
        };
        let project = project_from_row(&project_row)?;

        let document_rows = sqlx::query(&format!(
            "DELETE FROM documents WHERE project_id = $1 RETURNING {DOCUMENT_COLUMNS}"
        ))
        .bind(id.as_uuid())
        .fetch_all(&mut *tx)
        .await
        .map_err(query_error)?;
        let documents = document_rows
            .iter()
            .map(document_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(query_error)?;

        tx.commit().await.map_err(query_error)?;
        Ok(Some((project, documents)))
    }

    #[instrument(skip(self), fields(project_id = %id))]
    async fn get_project(&self, id: ProjectId) -> Result<Option<Project>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(query_error)?;

        row.as_ref().map(project_from_row).transpose()
    }

    #[instrument(skip(self))]
    async fn list_projects(&self) -> Result<Vec<Project>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(query_error)?;

        rows.iter().map(project_from_row).collect()
    }

    #[instrument(skip(self, document), fields(document_id = %document.id))]
    async fn insert_document(&self, document: &Document) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO documents (
                id, project_id, name, mime_type, size, status, storage_key, thumbnail_key,
                extracted_content, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(document.id.as_uuid())
        .bind(document.project_id.as_uuid())
        .bind(&document.name)
        .bind(&document.mime_type)
        .bind(size_column(document.size))
        .bind(document.status.as_str())
        .bind(document.storage_key.as_ref().map(StorageKey::as_str))
        .bind(document.thumbnail_key.as_ref().map(StorageKey::as_str))
        .bind(&document.extracted_content)
        .bind(document.created_at)
        .bind(document.updated_at)
        .execute(&self.pool)
        .await
        .map_err(query_error)?;

        Ok(())
    }

    /// Writes every mutable column except status, which only moves through
    /// `update_document_status`.
    #[instrument(skip(self, document), fields(document_id = %document.id))]
    async fn update_document(&self, document: &Document) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE documents
            SET name = $1, thumbnail_key = $2, extracted_content = $3, updated_at = $4
            WHERE id = $5
            "#,
        )
        .bind(&document.name)
        .bind(document.thumbnail_key.as_ref().map(StorageKey::as_str))
        .bind(&document.extracted_content)
        .bind(document.updated_at)
        .bind(document.id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(query_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(document.id.to_string()));
        }
        Ok(())
    }

    #[instrument(skip(self, extracted_content), fields(document_id = %id, status = %status))]
    async fn update_document_status(
        &self,
        id: DocumentId,
        status: DocumentStatus,
        extracted_content: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE documents
            SET status = $1,
                extracted_content = COALESCE($2, extracted_content),
                updated_at = $3
            WHERE id = $4
            "#,
        )
        .bind(status.as_str())
        .bind(extracted_content)
        .bind(Utc::now())
        .bind(id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(query_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(id.to_string()));
        }
        Ok(())
    }

    #[instrument(skip(self), fields(document_id = %id))]
    async fn delete_document(&self, id: DocumentId) -> Result<Option<Document>, RepositoryError> {
        let row = sqlx::query(&format!(
            "DELETE FROM documents WHERE id = $1 RETURNING {DOCUMENT_COLUMNS}"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(query_error)?;

        row.as_ref().map(document_from_row).transpose()
    }

    #[instrument(skip(self), fields(document_id = %id))]
    async fn get_document(&self, id: DocumentId) -> Result<Option<Document>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(query_error)?;

        row.as_ref().map(document_from_row).transpose()
    }

    #[instrument(skip(self), fields(project_id = %project_id))]
    async fn list_documents_by_project(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<Document>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE project_id = $1 ORDER BY created_at DESC"
        ))
        .bind(project_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(query_error)?;

        rows.iter().map(document_from_row).collect()
    }

    #[instrument(skip(self))]
    async fn list_documents(&self) -> Result<Vec<Document>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(query_error)?;

        rows.iter().map(document_from_row).collect()
    }

    #[instrument(skip(self, signed_url), fields(document_id = %id))]
    async fn store_signed_url(
        &self,
        id: DocumentId,
        signed_url: &SignedUrl,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            UPDATE documents
            SET signed_url = $1, signed_url_issued_at = $2, signed_url_expires_at = $3
            WHERE id = $4
            "#,
        )
        .bind(&signed_url.url)
        .bind(signed_url.issued_at)
        .bind(signed_url.expires_at)
        .bind(id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(query_error)?;

        Ok(())
    }
}

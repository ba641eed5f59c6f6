use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{DocumentStatus, DocumentStatusError, ProjectId, SignedUrl, StorageKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(Uuid);

impl DocumentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw.trim()).ok().map(Self)
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: DocumentId,
    pub project_id: ProjectId,
    pub name: String,
    pub mime_type: String,
    pub size: u64,
    pub status: DocumentStatus,
    pub storage_key: Option<StorageKey>,
    pub thumbnail_key: Option<StorageKey>,
    pub extracted_content: Option<String>,
    #[serde(default)]
    pub signed_url: Option<SignedUrl>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    pub fn new(project_id: ProjectId, name: String, mime_type: String, size: u64) -> Self {
        let now = Utc::now();
        Self {
            id: DocumentId::new(),
            project_id,
            name,
            mime_type,
            size,
            status: DocumentStatus::Uploaded,
            storage_key: None,
            thumbnail_key: None,
            extracted_content: None,
            signed_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn transition_to(&mut self, next: DocumentStatus) -> Result<(), DocumentStatusError> {
        if !self.status.can_transition_to(next) {
            return Err(DocumentStatusError::IllegalTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Manual re-entry into `processing`, the only way out of a terminal state.
    pub fn begin_reprocessing(&mut self) {
        self.status = DocumentStatus::Processing;
        self.updated_at = Utc::now();
    }

    /// Copy without the ephemeral signed URL, suitable for durable snapshots.
    pub fn without_signed_url(&self) -> Self {
        Self {
            signed_url: None,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaType {
    PlainText,
    Pdf,
    Docx,
    LegacyDoc,
    Image,
    Unknown,
}

impl MediaType {
    pub fn from_mime(mime: &str) -> Self {
        let mime = mime
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match mime.as_str() {
            "application/pdf" => Self::Pdf,
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
                Self::Docx
            }
            "application/msword" => Self::LegacyDoc,
            m if m.starts_with("text/") => Self::PlainText,
            m if m.starts_with("image/") => Self::Image,
            _ => Self::Unknown,
        }
    }

    pub fn from_extension(file_name: &str) -> Self {
        let ext = std::path::Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("txt" | "md" | "csv") => Self::PlainText,
            Some("pdf") => Self::Pdf,
            Some("docx") => Self::Docx,
            Some("doc") => Self::LegacyDoc,
            Some("png" | "jpg" | "jpeg" | "gif" | "webp" | "tif" | "tiff" | "bmp") => Self::Image,
            _ => Self::Unknown,
        }
    }

    /// Declared type wins; the extension is consulted only for generic
    /// binary uploads.
    pub fn detect(mime: &str, file_name: &str) -> Self {
        match Self::from_mime(mime) {
            Self::Unknown => {
                let generic = mime.trim().is_empty()
                    || mime.trim().eq_ignore_ascii_case("application/octet-stream");
                if generic {
                    Self::from_extension(file_name)
                } else {
                    Self::Unknown
                }
            }
            known => known,
        }
    }
}

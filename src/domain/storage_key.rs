use std::fmt;

use serde::{Deserialize, Serialize};

use super::{CompanyId, DocumentId, ProjectId};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorageKey(String);

impl StorageKey {
    /// `{companyId}/{projectId}/files/{documentId}_{timestamp}_{sanitizedName}`
    pub fn for_upload(
        company_id: &CompanyId,
        project_id: &ProjectId,
        document_id: &DocumentId,
        timestamp_millis: i64,
        file_name: &str,
    ) -> Self {
        Self(format!(
            "{}/{}/files/{}_{}_{}",
            sanitize_segment(company_id.as_str()),
            project_id,
            document_id,
            timestamp_millis,
            sanitize_segment(file_name)
        ))
    }

    pub fn from_raw(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn sanitize_segment(raw: &str) -> String {
    let sanitized: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.is_empty() || sanitized.chars().all(|c| c == '.') {
        "_".to_string()
    } else {
        sanitized
    }
}

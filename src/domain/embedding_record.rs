use std::fmt;

use serde_json::{Map, Value};

use super::{DocumentId, Embedding, ProjectId};

/// Vector index partition holding every vector of one project.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace(String);

impl Namespace {
    pub fn for_project(project_id: &ProjectId) -> Self {
        Self(project_id.to_string())
    }

    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Index-safe key derived from a document id: `[A-Za-z0-9_-]` only.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VectorId(String);

impl VectorId {
    pub fn sanitize(raw: &str) -> Self {
        let sanitized: String = raw
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        if sanitized.is_empty() {
            Self("_".to_string())
        } else {
            Self(sanitized)
        }
    }

    pub fn for_document(document_id: &DocumentId) -> Self {
        Self::sanitize(&document_id.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingRecord {
    pub id: VectorId,
    pub namespace: Namespace,
    pub embedding: Embedding,
    pub metadata: Map<String, Value>,
}

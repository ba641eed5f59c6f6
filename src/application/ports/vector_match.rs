use serde_json::{Map, Value};

use crate::domain::VectorId;

/// One ranked hit. `score` is the index's native similarity, higher is closer.
#[derive(Debug, Clone)]
pub struct VectorMatch {
    pub id: VectorId,
    pub score: f32,
    pub metadata: Map<String, Value>,
}

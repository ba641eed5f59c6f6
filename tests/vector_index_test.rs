use serde_json::{Map, json};

use scopeiq::application::ports::{VectorIndex, VectorIndexError};
use scopeiq::domain::{Embedding, EmbeddingRecord, Namespace, VectorId};
use scopeiq::infrastructure::persistence::{InMemoryVectorIndex, QdrantAdapter};

fn record(namespace: &str, id: &str, values: Vec<f32>) -> EmbeddingRecord {
    let mut metadata = Map::new();
    metadata.insert("label".into(), json!(id));
    EmbeddingRecord {
        id: VectorId::sanitize(id),
        namespace: Namespace::from_raw(namespace),
        embedding: Embedding::new(values),
        metadata,
    }
}

#[tokio::test]
async fn given_vectors_when_querying_then_results_are_ranked_by_similarity() {
    let index = InMemoryVectorIndex::new();
    index.upsert(record("p1", "near", vec![1.0, 0.1])).await.unwrap();
    index.upsert(record("p1", "far", vec![0.0, 1.0])).await.unwrap();
    index.upsert(record("p1", "mid", vec![1.0, 1.0])).await.unwrap();

    let matches = index
        .query(&Namespace::from_raw("p1"), &Embedding::new(vec![1.0, 0.0]), 2)
        .await
        .unwrap();

    let ids: Vec<&str> = matches.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["near", "mid"]);
    assert!(matches[0].score > matches[1].score);
    assert_eq!(matches[0].metadata["label"], "near");
}

#[tokio::test]
async fn given_wrong_dimension_when_upserting_into_namespace_then_upsert_fails() {
    let index = InMemoryVectorIndex::new();
    index.upsert(record("p1", "a", vec![1.0, 0.0])).await.unwrap();

    let result = index.upsert(record("p1", "b", vec![1.0, 0.0, 0.0])).await;

    assert!(matches!(result, Err(VectorIndexError::UpsertFailed(_))));
    index.upsert(record("p2", "b", vec![1.0, 0.0, 0.0])).await.unwrap();
}

#[tokio::test]
async fn given_namespace_when_deleted_then_only_that_namespace_is_emptied() {
    let index = InMemoryVectorIndex::new();
    index.upsert(record("p1", "a", vec![1.0])).await.unwrap();
    index.upsert(record("p2", "b", vec![1.0])).await.unwrap();

    index.delete_namespace(&Namespace::from_raw("p1")).await.unwrap();
    index
        .delete_many(&Namespace::from_raw("missing"), &[VectorId::sanitize("x")])
        .await
        .unwrap();

    assert_eq!(index.namespace_len(&Namespace::from_raw("p1")).await, 0);
    assert_eq!(index.namespace_len(&Namespace::from_raw("p2")).await, 1);
}

#[test]
fn given_same_namespace_and_id_when_deriving_point_id_then_it_is_stable() {
    let namespace = Namespace::from_raw("p1");
    let id = VectorId::sanitize("doc-1");

    let first = QdrantAdapter::point_uuid(&namespace, &id);
    let second = QdrantAdapter::point_uuid(&namespace, &id);
    let elsewhere = QdrantAdapter::point_uuid(&Namespace::from_raw("p2"), &id);

    assert_eq!(first, second);
    assert_ne!(first, elsewhere);
    assert_eq!(first.get_version_num(), 5);
}

#[tokio::test]
async fn given_prefix_when_naming_collection_then_namespace_is_appended() {
    let adapter = QdrantAdapter::new("http://localhost:6334", "project_", 64).unwrap();

    assert_eq!(
        adapter.collection_name(&Namespace::from_raw("abc")),
        "project_abc"
    );
}

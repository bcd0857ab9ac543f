//! Qdrant vector backend.

use async_trait::async_trait;
use qdrant_client::{
    client::QdrantClient,
    qdrant::{
        condition::ConditionOneOf, r#match::MatchValue, vectors_config::Config,
        with_payload_selector::SelectorOptions, Condition, CreateCollection, Distance,
        FieldCondition, Filter, Match, PointStruct, PointsSelector, ScrollPoints, SearchPoints,
        Value as QdrantValue, VectorParams, VectorsConfig, WithPayloadSelector,
    },
};
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;
use uuid::Uuid;

use crate::errors::{RagError, Result};
use crate::store::backend::{ScoredChunk, StoredChunk, VectorBackend};
use crate::types::DocumentInfo;

/// Payload keys that are part of the record structure; everything else is
/// chunk metadata
const STRUCTURAL_KEYS: [&str; 5] = ["id", "document_id", "filename", "chunk_index", "content"];

/// Scroll page size for full-collection scans
const SCROLL_PAGE: u32 = 256;

/// The Qdrant client surfaces `anyhow` errors; fold them into the storage
/// taxonomy with a short operation label
fn storage_error(operation: &'static str) -> impl FnOnce(anyhow::Error) -> RagError {
    move |e| RagError::Storage(format!("{} failed: {}", operation, e))
}

/// Vector backend over a single Qdrant collection
pub struct QdrantBackend {
    client: QdrantClient,
    collection: String,
}

impl QdrantBackend {
    /// Connect and ensure the collection exists with cosine distance and
    /// the given embedding dimension
    pub async fn new(url: &str, collection: &str, dimension: usize) -> Result<Self> {
        let client = QdrantClient::from_url(url)
            .build()
            .map_err(storage_error("Qdrant client setup"))?;

        let backend = Self {
            client,
            collection: collection.to_string(),
        };
        backend.ensure_collection(dimension).await?;

        Ok(backend)
    }

    async fn ensure_collection(&self, dimension: usize) -> Result<()> {
        let collections = self
            .client
            .list_collections()
            .await
            .map_err(storage_error("list collections"))?;

        let exists = collections
            .collections
            .iter()
            .any(|c| c.name == self.collection);

        if !exists {
            self.client
                .create_collection(&CreateCollection {
                    collection_name: self.collection.clone(),
                    vectors_config: Some(VectorsConfig {
                        config: Some(Config::Params(VectorParams {
                            size: dimension as u64,
                            distance: Distance::Cosine.into(),
                            ..Default::default()
                        })),
                    }),
                    ..Default::default()
                })
                .await
                .map_err(|e| {
                    RagError::Storage(format!(
                        "failed to create collection {}: {}",
                        self.collection, e
                    ))
                })?;
        }

        Ok(())
    }

    /// Qdrant accepts only integer or UUID point ids, so the chunk id maps
    /// to a deterministic UUIDv5 while the chunk id itself stays in the
    /// payload
    fn point_id(chunk_id: &str) -> String {
        Uuid::new_v5(&Uuid::NAMESPACE_OID, chunk_id.as_bytes()).to_string()
    }

    fn document_filter(document_id: &str) -> Filter {
        Filter {
            must: vec![Condition {
                condition_one_of: Some(ConditionOneOf::Field(FieldCondition {
                    key: "document_id".to_string(),
                    r#match: Some(Match {
                        match_value: Some(MatchValue::Keyword(document_id.to_string())),
                    }),
                    ..Default::default()
                })),
            }],
            ..Default::default()
        }
    }

    fn content_filter(needle: &str) -> Filter {
        Filter {
            must: vec![Condition {
                condition_one_of: Some(ConditionOneOf::Field(FieldCondition {
                    key: "content".to_string(),
                    r#match: Some(Match {
                        match_value: Some(MatchValue::Text(needle.to_string())),
                    }),
                    ..Default::default()
                })),
            }],
            ..Default::default()
        }
    }

    fn with_payload() -> WithPayloadSelector {
        WithPayloadSelector {
            selector_options: Some(SelectorOptions::Enable(true)),
        }
    }

    fn chunk_from_payload(payload: HashMap<String, QdrantValue>) -> StoredChunk {
        let get_string = |key: &str| {
            payload
                .get(key)
                .and_then(qdrant_value_to_string)
                .unwrap_or_default()
        };
        let chunk_index = payload
            .get("chunk_index")
            .and_then(qdrant_value_to_i64)
            .unwrap_or(0) as usize;

        let mut metadata = Map::new();
        for (key, value) in &payload {
            if !STRUCTURAL_KEYS.contains(&key.as_str()) {
                if let Some(json_value) = qdrant_to_json_value(value) {
                    metadata.insert(key.clone(), json_value);
                }
            }
        }

        StoredChunk {
            id: get_string("id"),
            document_id: get_string("document_id"),
            filename: get_string("filename"),
            chunk_index,
            content: get_string("content"),
            metadata,
        }
    }

    async fn scroll_chunks(&self, filter: Option<Filter>, max: usize) -> Result<Vec<StoredChunk>> {
        let mut chunks = Vec::new();
        let mut offset = None;

        loop {
            let page = self
                .client
                .scroll(&ScrollPoints {
                    collection_name: self.collection.clone(),
                    filter: filter.clone(),
                    offset: offset.clone(),
                    limit: Some(SCROLL_PAGE),
                    with_payload: Some(Self::with_payload()),
                    ..Default::default()
                })
                .await
                .map_err(storage_error("scroll"))?;

            for point in page.result {
                chunks.push(Self::chunk_from_payload(point.payload));
                if chunks.len() >= max {
                    return Ok(chunks);
                }
            }

            match page.next_page_offset {
                Some(next) => offset = Some(next),
                None => return Ok(chunks),
            }
        }
    }
}

#[async_trait]
impl VectorBackend for QdrantBackend {
    async fn upsert(&self, chunk: StoredChunk, embedding: Vec<f32>) -> Result<()> {
        let mut payload: HashMap<String, QdrantValue> = HashMap::new();
        payload.insert("id".to_string(), QdrantValue::from(chunk.id.clone()));
        payload.insert(
            "document_id".to_string(),
            QdrantValue::from(chunk.document_id),
        );
        payload.insert("filename".to_string(), QdrantValue::from(chunk.filename));
        payload.insert(
            "chunk_index".to_string(),
            QdrantValue::from(chunk.chunk_index as i64),
        );
        payload.insert("content".to_string(), QdrantValue::from(chunk.content));
        for (key, value) in chunk.metadata {
            payload.insert(key, json_to_qdrant_value(value));
        }

        let point = PointStruct::new(Self::point_id(&chunk.id), embedding, payload);

        self.client
            .upsert_points_blocking(&self.collection, None, vec![point], None)
            .await
            .map_err(storage_error("upsert"))?;

        Ok(())
    }

    async fn vector_query(
        &self,
        embedding: &[f32],
        top_n: usize,
        min_score: f32,
    ) -> Result<Vec<ScoredChunk>> {
        let search_result = self
            .client
            .search_points(&SearchPoints {
                collection_name: self.collection.clone(),
                vector: embedding.to_vec(),
                limit: top_n as u64,
                score_threshold: Some(min_score),
                with_payload: Some(Self::with_payload()),
                ..Default::default()
            })
            .await
            .map_err(storage_error("vector search"))?;

        Ok(search_result
            .result
            .into_iter()
            .map(|point| ScoredChunk {
                score: point.score,
                chunk: Self::chunk_from_payload(point.payload),
            })
            .collect())
    }

    async fn substring_query(&self, needle: &str, top_n: usize) -> Result<Vec<StoredChunk>> {
        self.scroll_chunks(Some(Self::content_filter(needle)), top_n)
            .await
    }

    async fn document_chunks(&self, document_id: &str) -> Result<Vec<StoredChunk>> {
        let mut chunks = self
            .scroll_chunks(Some(Self::document_filter(document_id)), usize::MAX)
            .await?;
        chunks.sort_by_key(|c| c.chunk_index);
        Ok(chunks)
    }

    async fn delete_document(&self, document_id: &str) -> Result<usize> {
        let count = self.document_chunks(document_id).await?.len();

        self.client
            .delete_points(
                &self.collection,
                None,
                &PointsSelector {
                    points_selector_one_of: Some(
                        qdrant_client::qdrant::points_selector::PointsSelectorOneOf::Filter(
                            Self::document_filter(document_id),
                        ),
                    ),
                },
                None,
            )
            .await
            .map_err(storage_error("delete"))?;

        Ok(count)
    }

    async fn list_documents(&self, skip: usize, limit: usize) -> Result<Vec<DocumentInfo>> {
        let chunks = self.scroll_chunks(None, usize::MAX).await?;

        let mut order = Vec::new();
        let mut documents: HashMap<String, DocumentInfo> = HashMap::new();
        for chunk in chunks {
            match documents.get_mut(&chunk.document_id) {
                Some(info) => info.chunk_count += 1,
                None => {
                    order.push(chunk.document_id.clone());
                    documents.insert(
                        chunk.document_id.clone(),
                        DocumentInfo {
                            document_id: chunk.document_id,
                            filename: chunk.filename,
                            chunk_count: 1,
                            metadata: chunk.metadata,
                        },
                    );
                }
            }
        }

        Ok(order
            .into_iter()
            .skip(skip)
            .take(limit)
            .filter_map(|id| documents.remove(&id))
            .collect())
    }
}

// Helper functions for payload value conversions
fn json_to_qdrant_value(json: JsonValue) -> QdrantValue {
    match json {
        JsonValue::String(s) => QdrantValue::from(s),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                QdrantValue::from(i)
            } else if let Some(f) = n.as_f64() {
                QdrantValue::from(f)
            } else {
                QdrantValue::from(0)
            }
        }
        JsonValue::Bool(b) => QdrantValue::from(b),
        _ => QdrantValue::from(""),
    }
}

fn qdrant_to_json_value(value: &QdrantValue) -> Option<JsonValue> {
    value.kind.as_ref().and_then(|kind| {
        use qdrant_client::qdrant::value::Kind;
        match kind {
            Kind::StringValue(s) => Some(JsonValue::String(s.clone())),
            Kind::IntegerValue(i) => Some(JsonValue::Number((*i).into())),
            Kind::DoubleValue(f) => serde_json::Number::from_f64(*f).map(JsonValue::Number),
            Kind::BoolValue(b) => Some(JsonValue::Bool(*b)),
            _ => None,
        }
    })
}

fn qdrant_value_to_string(value: &QdrantValue) -> Option<String> {
    value.kind.as_ref().and_then(|kind| {
        use qdrant_client::qdrant::value::Kind;
        match kind {
            Kind::StringValue(s) => Some(s.clone()),
            _ => None,
        }
    })
}

fn qdrant_value_to_i64(value: &QdrantValue) -> Option<i64> {
    value.kind.as_ref().and_then(|kind| {
        use qdrant_client::qdrant::value::Kind;
        match kind {
            Kind::IntegerValue(i) => Some(*i),
            _ => None,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_id_deterministic() {
        let a = QdrantBackend::point_id("doc-1_chunk_0");
        let b = QdrantBackend::point_id("doc-1_chunk_0");
        let c = QdrantBackend::point_id("doc-1_chunk_1");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(Uuid::parse_str(&a).is_ok());
    }

    #[test]
    fn test_chunk_from_payload_separates_metadata() {
        let mut payload = HashMap::new();
        payload.insert("id".to_string(), QdrantValue::from("d_chunk_2"));
        payload.insert("document_id".to_string(), QdrantValue::from("d"));
        payload.insert("filename".to_string(), QdrantValue::from("f.txt"));
        payload.insert("chunk_index".to_string(), QdrantValue::from(2_i64));
        payload.insert("content".to_string(), QdrantValue::from("text"));
        payload.insert("char_count".to_string(), QdrantValue::from(4_i64));
        payload.insert(
            "classification".to_string(),
            QdrantValue::from("CONFIDENTIAL"),
        );

        let chunk = QdrantBackend::chunk_from_payload(payload);
        assert_eq!(chunk.id, "d_chunk_2");
        assert_eq!(chunk.chunk_index, 2);
        assert_eq!(chunk.metadata.len(), 2);
        assert_eq!(chunk.metadata["char_count"], JsonValue::from(4));
    }

    #[tokio::test]
    #[ignore] // Integration test - requires Qdrant
    async fn test_roundtrip_against_live_qdrant() {
        let backend = QdrantBackend::new("http://localhost:6334", "chainsight_test", 4)
            .await
            .unwrap();

        let chunk = StoredChunk {
            id: "doc-1_chunk_0".to_string(),
            document_id: "doc-1".to_string(),
            filename: "test.txt".to_string(),
            chunk_index: 0,
            content: "freight rates".to_string(),
            metadata: Map::new(),
        };
        backend
            .upsert(chunk, vec![0.1, 0.2, 0.3, 0.4])
            .await
            .unwrap();

        let results = backend
            .vector_query(&[0.1, 0.2, 0.3, 0.4], 5, 0.5)
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].chunk.id, "doc-1_chunk_0");

        backend.delete_document("doc-1").await.unwrap();
    }
}

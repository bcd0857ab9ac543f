//! Vector backend contract.
//!
//! One record per chunk; `document_id` is the partition key, so all chunks
//! of a document are co-located and scoped operations address them together.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::Result;
use crate::types::DocumentInfo;

/// Persisted chunk payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredChunk {
    /// Chunk identifier, `{document_id}_chunk_{index}`
    pub id: String,
    /// Partition key
    pub document_id: String,
    pub filename: String,
    pub chunk_index: usize,
    pub content: String,
    pub metadata: Map<String, Value>,
}

/// A stored chunk with its similarity score
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: StoredChunk,
    pub score: f32,
}

/// Storage backend with vector-distance and substring query support,
/// scoped to a single collection
#[async_trait]
pub trait VectorBackend: Send + Sync {
    /// Insert or replace one chunk record
    async fn upsert(&self, chunk: StoredChunk, embedding: Vec<f32>) -> Result<()>;

    /// Vector-distance ranked query: matches scoring above `min_score`,
    /// descending, at most `top_n`
    async fn vector_query(
        &self,
        embedding: &[f32],
        top_n: usize,
        min_score: f32,
    ) -> Result<Vec<ScoredChunk>>;

    /// Substring-containment query over chunk content, at most `top_n`
    async fn substring_query(&self, needle: &str, top_n: usize) -> Result<Vec<StoredChunk>>;

    /// All chunk records of one document
    async fn document_chunks(&self, document_id: &str) -> Result<Vec<StoredChunk>>;

    /// Delete all chunks of one document, returning the number removed
    async fn delete_document(&self, document_id: &str) -> Result<usize>;

    /// Distinct documents in the collection, paged
    async fn list_documents(&self, skip: usize, limit: usize) -> Result<Vec<DocumentInfo>>;
}

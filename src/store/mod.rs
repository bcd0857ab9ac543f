//! Indexed document store.
//!
//! Coordinates the chunker, the embedding provider, and the vector backend:
//! documents go in as chunked, embedded records; questions come back out as
//! scored `SourceMatch` lists, degrading from similarity search to keyword
//! search when the vector path fails.

pub mod backend;
pub mod memory;
pub mod qdrant;

pub use backend::{ScoredChunk, StoredChunk, VectorBackend};
pub use memory::InMemoryBackend;
pub use qdrant::QdrantBackend;

use chrono::Utc;
use serde_json::{Map, Value};
use std::sync::Arc;
use uuid::Uuid;

use crate::chunker::{Chunk, Chunker};
use crate::config::RagConfig;
use crate::errors::Result;
use crate::providers::EmbeddingProvider;
use crate::types::{DocumentInfo, SourceMatch};

/// Fixed score carried by keyword-fallback matches, marking them as
/// non-semantic
pub const KEYWORD_MATCH_SCORE: f32 = 0.5;

/// Metadata key naming the retrieval method on fallback matches
pub const RETRIEVAL_METHOD_KEY: &str = "retrieval";

/// Document store over a vector backend and an embedding provider
pub struct IndexedStore {
    backend: Arc<dyn VectorBackend>,
    embeddings: Arc<dyn EmbeddingProvider>,
    chunker: Chunker,
    classification: String,
}

impl IndexedStore {
    pub fn new(
        backend: Arc<dyn VectorBackend>,
        embeddings: Arc<dyn EmbeddingProvider>,
        config: &RagConfig,
    ) -> Result<Self> {
        Ok(Self {
            backend,
            embeddings,
            chunker: Chunker::from_config(&config.chunking)?,
            classification: config.data_classification.clone(),
        })
    }

    /// Chunk a document and index it under a fresh document id
    pub async fn index_document(
        &self,
        filename: &str,
        text: &str,
        metadata: Map<String, Value>,
    ) -> Result<String> {
        let document_id = Uuid::new_v4().to_string();
        let chunks = self.chunker.split(text);
        self.index(&document_id, filename, &chunks, &metadata).await?;
        Ok(document_id)
    }

    /// Embed and persist each chunk independently.
    ///
    /// There is no atomicity across chunks: a mid-loop failure leaves the
    /// chunks already written in place and queryable, which is the
    /// documented behavior rather than an error state.
    pub async fn index(
        &self,
        document_id: &str,
        filename: &str,
        chunks: &[Chunk],
        metadata: &Map<String, Value>,
    ) -> Result<()> {
        let created_at = Utc::now().to_rfc3339();

        for (index, chunk) in chunks.iter().enumerate() {
            let embedding = self.embeddings.embed(&chunk.text).await?;

            let mut chunk_metadata = metadata.clone();
            chunk_metadata.insert(
                "classification".to_string(),
                Value::from(self.classification.clone()),
            );
            chunk_metadata.insert("total_chunks".to_string(), Value::from(chunks.len()));
            chunk_metadata.insert(
                "char_count".to_string(),
                Value::from(chunk.text.chars().count()),
            );
            chunk_metadata.insert("created_at".to_string(), Value::from(created_at.clone()));

            self.backend
                .upsert(
                    StoredChunk {
                        id: format!("{}_chunk_{}", document_id, index),
                        document_id: document_id.to_string(),
                        filename: filename.to_string(),
                        chunk_index: index,
                        content: chunk.text.clone(),
                        metadata: chunk_metadata,
                    },
                    embedding,
                )
                .await?;
        }

        tracing::info!(
            document_id,
            filename,
            chunks = chunks.len(),
            "document indexed"
        );
        Ok(())
    }

    /// Vector similarity search: matches above `min_score`, descending,
    /// truncated to `top_n`. Falls back to `keyword_search` when the vector
    /// path fails.
    pub async fn similarity_search(
        &self,
        query: &str,
        top_n: usize,
        min_score: f32,
    ) -> Result<Vec<SourceMatch>> {
        match self.vector_search(query, top_n, min_score).await {
            Ok(matches) => {
                tracing::info!(count = matches.len(), "vector search returned results");
                Ok(matches)
            }
            Err(e) => {
                tracing::warn!(error = %e, "vector search failed, degrading to keyword search");
                self.keyword_search(query, top_n).await
            }
        }
    }

    async fn vector_search(
        &self,
        query: &str,
        top_n: usize,
        min_score: f32,
    ) -> Result<Vec<SourceMatch>> {
        let query_embedding = self.embeddings.embed(query).await?;
        let mut scored = self
            .backend
            .vector_query(&query_embedding, top_n, min_score)
            .await?;

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_n);

        Ok(scored
            .into_iter()
            .map(|s| SourceMatch {
                content: s.chunk.content,
                source: s.chunk.filename,
                score: s.score,
                metadata: s.chunk.metadata,
                document_id: s.chunk.document_id,
            })
            .collect())
    }

    /// Last-resort substring search; every match carries the fixed
    /// `KEYWORD_MATCH_SCORE` and a metadata marker naming the method
    pub async fn keyword_search(&self, query: &str, top_n: usize) -> Result<Vec<SourceMatch>> {
        let chunks = self.backend.substring_query(query, top_n).await?;

        Ok(chunks
            .into_iter()
            .map(|chunk| {
                let mut metadata = chunk.metadata;
                metadata.insert(
                    RETRIEVAL_METHOD_KEY.to_string(),
                    Value::from("keyword"),
                );
                SourceMatch {
                    content: chunk.content,
                    source: chunk.filename,
                    score: KEYWORD_MATCH_SCORE,
                    metadata,
                    document_id: chunk.document_id,
                }
            })
            .collect())
    }

    /// Administrative view of one document, `None` if it has no chunks
    pub async fn get(&self, document_id: &str) -> Result<Option<DocumentInfo>> {
        let chunks = self.backend.document_chunks(document_id).await?;
        Ok(chunks.first().map(|first| DocumentInfo {
            document_id: document_id.to_string(),
            filename: first.filename.clone(),
            chunk_count: chunks.len(),
            metadata: first.metadata.clone(),
        }))
    }

    /// Page through distinct indexed documents
    pub async fn list(&self, skip: usize, limit: usize) -> Result<Vec<DocumentInfo>> {
        self.backend.list_documents(skip, limit).await
    }

    /// Delete a document and all its chunks, returning the number removed
    pub async fn delete(&self, document_id: &str) -> Result<usize> {
        let removed = self.backend.delete_document(document_id).await?;
        tracing::info!(document_id, chunks = removed, "document deleted");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::RagError;
    use async_trait::async_trait;

    /// Embedding stub mapping each text to a unit axis chosen by keyword
    struct AxisEmbedding;

    #[async_trait]
    impl EmbeddingProvider for AxisEmbedding {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let lower = text.to_lowercase();
            let mut v = vec![0.0_f32; 4];
            if lower.contains("freight") {
                v[0] = 1.0;
            }
            if lower.contains("customs") {
                v[1] = 1.0;
            }
            if lower.contains("warehouse") {
                v[2] = 1.0;
            }
            if v.iter().all(|x| *x == 0.0) {
                v[3] = 1.0;
            }
            Ok(v)
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            let mut out = Vec::new();
            for text in texts {
                out.push(self.embed(text).await?);
            }
            Ok(out)
        }

        fn dimension(&self) -> usize {
            4
        }
    }

    /// Backend whose vector path always fails, while substring queries and
    /// writes go through to an inner in-memory backend
    struct BrokenVectorBackend {
        inner: InMemoryBackend,
    }

    #[async_trait]
    impl VectorBackend for BrokenVectorBackend {
        async fn upsert(&self, chunk: StoredChunk, embedding: Vec<f32>) -> Result<()> {
            self.inner.upsert(chunk, embedding).await
        }

        async fn vector_query(
            &self,
            _embedding: &[f32],
            _top_n: usize,
            _min_score: f32,
        ) -> Result<Vec<ScoredChunk>> {
            Err(RagError::Storage("vector index unavailable".to_string()))
        }

        async fn substring_query(&self, needle: &str, top_n: usize) -> Result<Vec<StoredChunk>> {
            self.inner.substring_query(needle, top_n).await
        }

        async fn document_chunks(&self, document_id: &str) -> Result<Vec<StoredChunk>> {
            self.inner.document_chunks(document_id).await
        }

        async fn delete_document(&self, document_id: &str) -> Result<usize> {
            self.inner.delete_document(document_id).await
        }

        async fn list_documents(&self, skip: usize, limit: usize) -> Result<Vec<DocumentInfo>> {
            self.inner.list_documents(skip, limit).await
        }
    }

    fn store_over(backend: Arc<dyn VectorBackend>) -> IndexedStore {
        IndexedStore::new(backend, Arc::new(AxisEmbedding), &RagConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_index_document_stamps_chunk_metadata() {
        let backend = Arc::new(InMemoryBackend::new());
        let store = store_over(backend.clone());

        let document_id = store
            .index_document("rates.txt", "freight rates for Q3", Map::new())
            .await
            .unwrap();

        let chunks = backend.document_chunks(&document_id).await.unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].id, format!("{}_chunk_0", document_id));
        assert_eq!(chunks[0].metadata["classification"], "CONFIDENTIAL");
        assert_eq!(chunks[0].metadata["total_chunks"], 1);
        assert_eq!(chunks[0].metadata["char_count"], 20);
        assert!(chunks[0].metadata.contains_key("created_at"));
    }

    #[tokio::test]
    async fn test_similarity_search_orders_by_score() {
        let backend = Arc::new(InMemoryBackend::new());
        let store = store_over(backend);

        store
            .index_document("a.txt", "freight rates", Map::new())
            .await
            .unwrap();
        store
            .index_document("b.txt", "freight and customs duties", Map::new())
            .await
            .unwrap();

        let matches = store.similarity_search("freight", 5, 0.1).await.unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].source, "a.txt");
        assert!(matches[0].score > matches[1].score);
    }

    #[tokio::test]
    async fn test_vector_failure_degrades_to_keyword_search() {
        let backend = Arc::new(BrokenVectorBackend {
            inner: InMemoryBackend::new(),
        });
        let store = store_over(backend);

        store
            .index_document("a.txt", "customs clearance backlog", Map::new())
            .await
            .unwrap();

        let matches = store.similarity_search("customs", 5, 0.7).await.unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].score, KEYWORD_MATCH_SCORE);
        assert_eq!(matches[0].metadata[RETRIEVAL_METHOD_KEY], "keyword");
    }

    #[tokio::test]
    async fn test_get_and_delete() {
        let backend = Arc::new(InMemoryBackend::new());
        let store = store_over(backend);

        let document_id = store
            .index_document("a.txt", "warehouse utilization", Map::new())
            .await
            .unwrap();

        let info = store.get(&document_id).await.unwrap().unwrap();
        assert_eq!(info.filename, "a.txt");
        assert_eq!(info.chunk_count, 1);

        let removed = store.delete(&document_id).await.unwrap();
        assert_eq!(removed, 1);
        assert!(store.get(&document_id).await.unwrap().is_none());
    }
}

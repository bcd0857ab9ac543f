//! In-memory vector backend.
//!
//! Cosine-similarity reference backend for tests, demos, and single-process
//! deployments without an external vector store.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::errors::Result;
use crate::store::backend::{ScoredChunk, StoredChunk, VectorBackend};
use crate::types::DocumentInfo;

/// Cosine similarity between two vectors; 0.0 when either norm is zero
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// In-memory backend storing chunks with their embeddings in insertion order
#[derive(Default)]
pub struct InMemoryBackend {
    records: RwLock<Vec<(StoredChunk, Vec<f32>)>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored chunk records
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl VectorBackend for InMemoryBackend {
    async fn upsert(&self, chunk: StoredChunk, embedding: Vec<f32>) -> Result<()> {
        let mut records = self.records.write().await;
        if let Some(existing) = records.iter_mut().find(|(c, _)| c.id == chunk.id) {
            *existing = (chunk, embedding);
        } else {
            records.push((chunk, embedding));
        }
        Ok(())
    }

    async fn vector_query(
        &self,
        embedding: &[f32],
        top_n: usize,
        min_score: f32,
    ) -> Result<Vec<ScoredChunk>> {
        let records = self.records.read().await;
        let mut scored: Vec<ScoredChunk> = records
            .iter()
            .map(|(chunk, vector)| ScoredChunk {
                chunk: chunk.clone(),
                score: cosine_similarity(embedding, vector),
            })
            .filter(|s| s.score > min_score)
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_n);
        Ok(scored)
    }

    async fn substring_query(&self, needle: &str, top_n: usize) -> Result<Vec<StoredChunk>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|(chunk, _)| chunk.content.contains(needle))
            .take(top_n)
            .map(|(chunk, _)| chunk.clone())
            .collect())
    }

    async fn document_chunks(&self, document_id: &str) -> Result<Vec<StoredChunk>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|(chunk, _)| chunk.document_id == document_id)
            .map(|(chunk, _)| chunk.clone())
            .collect())
    }

    async fn delete_document(&self, document_id: &str) -> Result<usize> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|(chunk, _)| chunk.document_id != document_id);
        Ok(before - records.len())
    }

    async fn list_documents(&self, skip: usize, limit: usize) -> Result<Vec<DocumentInfo>> {
        let records = self.records.read().await;
        let mut order = Vec::new();
        let mut counts: HashMap<String, DocumentInfo> = HashMap::new();

        for (chunk, _) in records.iter() {
            match counts.get_mut(&chunk.document_id) {
                Some(info) => info.chunk_count += 1,
                None => {
                    order.push(chunk.document_id.clone());
                    counts.insert(
                        chunk.document_id.clone(),
                        DocumentInfo {
                            document_id: chunk.document_id.clone(),
                            filename: chunk.filename.clone(),
                            chunk_count: 1,
                            metadata: chunk.metadata.clone(),
                        },
                    );
                }
            }
        }

        Ok(order
            .into_iter()
            .skip(skip)
            .take(limit)
            .filter_map(|id| counts.remove(&id))
            .collect())
    }
}

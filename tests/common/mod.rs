//! Shared mock providers for integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chainsight::errors::{RagError, Result};
use chainsight::providers::{EmbeddingProvider, GenerationProvider, GenerationRequest};
use chainsight::store::{InMemoryBackend, ScoredChunk, StoredChunk, VectorBackend};
use chainsight::types::DocumentInfo;

/// Keyword axes for the deterministic embedding mock
const KEYWORDS: [&str; 4] = ["freight", "customs", "warehouse", "tariff"];

/// Deterministic embedding provider: one axis per keyword, plus a catch-all
/// axis for texts mentioning none of them. Texts sharing keywords land close
/// together, so similarity scores are predictable.
pub struct KeywordEmbedding {
    calls: AtomicUsize,
    fail_after: Option<usize>,
}

impl KeywordEmbedding {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_after: None,
        }
    }

    /// Succeed for the first `limit` embed calls, then fail
    pub fn failing_after(limit: usize) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_after: Some(limit),
        }
    }

    fn vector_for(text: &str) -> Vec<f32> {
        let lower = text.to_lowercase();
        let mut vector = vec![0.0_f32; KEYWORDS.len() + 1];
        for (axis, keyword) in KEYWORDS.iter().enumerate() {
            if lower.contains(keyword) {
                vector[axis] = 1.0;
            }
        }
        if vector.iter().all(|v| *v == 0.0) {
            vector[KEYWORDS.len()] = 1.0;
        }
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for KeywordEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(limit) = self.fail_after {
            if call > limit {
                return Err(RagError::Provider("embedding quota exhausted".to_string()));
            }
        }
        Ok(Self::vector_for(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }

    fn dimension(&self) -> usize {
        KEYWORDS.len() + 1
    }
}

/// Scripted generation provider.
///
/// Replies are chosen by prompt markers: decomposition prompts get the
/// configured decomposition reply (non-JSON by default), synthesis prompts
/// get a fixed synthesized answer or a scripted failure, and everything else
/// gets a fixed grounded answer. All requests are recorded for inspection.
pub struct ScriptedGeneration {
    decompose_reply: Mutex<Option<String>>,
    fail_synthesis: AtomicBool,
    delays: Mutex<Vec<(String, u64)>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

pub const SYNTHESIZED_ANSWER: &str = "synthesized answer";
pub const GROUNDED_ANSWER: &str = "grounded answer";

impl ScriptedGeneration {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            decompose_reply: Mutex::new(None),
            fail_synthesis: AtomicBool::new(false),
            delays: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Reply to decomposition prompts with this text
    pub fn set_decompose_reply(&self, reply: &str) {
        *self.decompose_reply.lock().unwrap() = Some(reply.to_string());
    }

    /// Fail synthesis prompts with a provider error
    pub fn fail_synthesis(&self) {
        self.fail_synthesis.store(true, Ordering::SeqCst);
    }

    /// Sleep before answering any prompt containing `marker`
    pub fn delay_prompt_containing(&self, marker: &str, millis: u64) {
        self.delays
            .lock()
            .unwrap()
            .push((marker.to_string(), millis));
    }

    /// All recorded requests, in call order
    pub fn recorded(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Recorded single-pass answer prompts
    pub fn single_pass_prompts(&self) -> Vec<String> {
        self.recorded()
            .into_iter()
            .filter(|r| r.prompt.starts_with("Context from documents:"))
            .map(|r| r.prompt)
            .collect()
    }

    /// Recorded synthesis prompts
    pub fn synthesis_prompts(&self) -> Vec<String> {
        self.recorded()
            .into_iter()
            .filter(|r| r.prompt.starts_with("Original Question:"))
            .map(|r| r.prompt)
            .collect()
    }
}

#[async_trait]
impl GenerationProvider for ScriptedGeneration {
    async fn generate(&self, request: GenerationRequest) -> Result<String> {
        self.requests.lock().unwrap().push(request.clone());

        let delay = self
            .delays
            .lock()
            .unwrap()
            .iter()
            .find(|(marker, _)| request.prompt.contains(marker))
            .map(|(_, millis)| *millis);
        if let Some(millis) = delay {
            tokio::time::sleep(Duration::from_millis(millis)).await;
        }

        if request
            .prompt
            .contains("Decompose this into focused sub-queries")
        {
            return Ok(self
                .decompose_reply
                .lock()
                .unwrap()
                .clone()
                .unwrap_or_else(|| "no decomposition available".to_string()));
        }

        if request.prompt.starts_with("Original Question:") {
            if self.fail_synthesis.load(Ordering::SeqCst) {
                return Err(RagError::Provider(
                    "synthesis backend unavailable".to_string(),
                ));
            }
            return Ok(SYNTHESIZED_ANSWER.to_string());
        }

        Ok(GROUNDED_ANSWER.to_string())
    }

    fn model(&self) -> &str {
        "mock-gpt-4"
    }
}

/// Backend whose vector path always fails while writes and substring
/// queries pass through to an inner in-memory backend
pub struct BrokenVectorBackend {
    pub inner: InMemoryBackend,
}

impl BrokenVectorBackend {
    pub fn new() -> Self {
        Self {
            inner: InMemoryBackend::new(),
        }
    }
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

//! Single-pass retrieval-augmented pipeline: one retrieval, one generation
//! call. The baseline strategy, and the degradation target for the agentic
//! orchestrator.

pub mod context;

pub use context::ContextBuilder;

use std::sync::Arc;
use uuid::Uuid;

use crate::config::RagConfig;
use crate::errors::Result;
use crate::providers::{GenerationProvider, GenerationRequest};
use crate::store::IndexedStore;
use crate::types::PipelineResult;

/// Canned answer returned when retrieval finds nothing; an explicit success
/// case, not an error
pub const NO_SOURCES_ANSWER: &str = "I don't have enough information in the knowledge base \
to answer this question. Please try rephrasing or ask about topics covered in the documentation.";

/// Per-call knobs for a pipeline or orchestrator invocation
#[derive(Debug, Clone)]
pub struct QueryOptions {
    pub max_sources: usize,
    pub temperature: f32,
    pub min_score: f32,
    /// Conversation id to reuse; a fresh one is minted when absent
    pub conversation_id: Option<String>,
}

impl QueryOptions {
    pub fn from_config(config: &RagConfig) -> Self {
        Self {
            max_sources: config.retrieval.max_sources,
            temperature: config.generation.temperature,
            min_score: config.retrieval.min_score,
            conversation_id: None,
        }
    }
}

/// Retrieval-augmented generation pipeline
pub struct RagPipeline {
    store: Arc<IndexedStore>,
    generation: Arc<dyn GenerationProvider>,
    max_tokens: u32,
}

impl RagPipeline {
    pub fn new(
        store: Arc<IndexedStore>,
        generation: Arc<dyn GenerationProvider>,
        config: &RagConfig,
    ) -> Self {
        Self {
            store,
            generation,
            max_tokens: config.generation.max_tokens,
        }
    }

    /// Retrieve sources for the question and generate a grounded answer.
    ///
    /// Empty retrieval returns the canned insufficient-information answer
    /// with no sources. Provider failures propagate to the caller.
    pub async fn answer(&self, question: &str, options: &QueryOptions) -> Result<PipelineResult> {
        tracing::info!("processing single-pass query");

        let sources = self
            .store
            .similarity_search(question, options.max_sources, options.min_score)
            .await?;

        let conversation_id = options
            .conversation_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        if sources.is_empty() {
            tracing::warn!("no relevant sources found");
            return Ok(PipelineResult {
                answer: NO_SOURCES_ANSWER.to_string(),
                sources: Vec::new(),
                conversation_id,
            });
        }

        tracing::info!(count = sources.len(), "retrieved relevant sources");

        let request = GenerationRequest::new(ContextBuilder::answer_prompt(question, &sources))
            .with_system_message(context::ANSWER_SYSTEM_MESSAGE)
            .with_temperature(options.temperature)
            .with_max_tokens(self.max_tokens);
        let answer = self.generation.generate(request).await?;

        Ok(PipelineResult {
            answer,
            sources,
            conversation_id,
        })
    }
}

//! Caller-facing query service.
//!
//! Routes boundary requests to the agentic orchestrator or the single-pass
//! pipeline and shapes the boundary response. HTTP framing, authentication,
//! and rendering live in the calling layer.

use std::sync::Arc;

use crate::agent::AgentOrchestrator;
use crate::config::RagConfig;
use crate::errors::Result;
use crate::ops::OperationExecutor;
use crate::pipeline::{QueryOptions, RagPipeline};
use crate::providers::{EmbeddingProvider, GenerationProvider};
use crate::store::{IndexedStore, VectorBackend};
use crate::types::{QueryRequest, QueryResponse};

/// Answer-generation service wired over injected capability providers
pub struct QueryService {
    store: Arc<IndexedStore>,
    pipeline: Arc<RagPipeline>,
    orchestrator: AgentOrchestrator,
    operations: OperationExecutor,
    model_used: String,
    config: RagConfig,
}

impl QueryService {
    /// Wire the full pipeline from its capability providers and config
    pub fn new(
        backend: Arc<dyn VectorBackend>,
        embeddings: Arc<dyn EmbeddingProvider>,
        generation: Arc<dyn GenerationProvider>,
        config: RagConfig,
    ) -> Result<Self> {
        let store = Arc::new(IndexedStore::new(backend, embeddings, &config)?);
        let pipeline = Arc::new(RagPipeline::new(
            Arc::clone(&store),
            Arc::clone(&generation),
            &config,
        ));
        let orchestrator =
            AgentOrchestrator::new(Arc::clone(&pipeline), Arc::clone(&generation), &config);
        let operations =
            OperationExecutor::new(Arc::clone(&store), Arc::clone(&generation), &config);

        Ok(Self {
            store,
            pipeline,
            orchestrator,
            operations,
            model_used: generation.model().to_string(),
            config,
        })
    }

    /// Answer a question, agentically when requested
    pub async fn ask(&self, request: QueryRequest) -> Result<QueryResponse> {
        tracing::info!(
            question = %truncate_for_log(&request.question),
            use_agentic = request.use_agentic,
            "processing question"
        );

        let options = QueryOptions {
            max_sources: request.max_sources,
            temperature: request
                .temperature
                .unwrap_or(self.config.generation.temperature),
            min_score: self.config.retrieval.min_score,
            conversation_id: request.conversation_id.clone(),
        };

        let response = if request.use_agentic {
            let result = self.orchestrator.process(&request.question, &options).await?;
            QueryResponse {
                answer: result.answer,
                sources: result.sources,
                conversation_id: request
                    .conversation_id
                    .unwrap_or(result.conversation_id),
                model_used: self.model_used.clone(),
                agent_reasoning: result.reasoning,
            }
        } else {
            let result = self.pipeline.answer(&request.question, &options).await?;
            QueryResponse {
                answer: result.answer,
                sources: result.sources,
                conversation_id: result.conversation_id,
                model_used: self.model_used.clone(),
                agent_reasoning: None,
            }
        };

        tracing::info!("question processed successfully");
        Ok(response)
    }

    /// Document store, for ingestion and administrative calls
    pub fn store(&self) -> &Arc<IndexedStore> {
        &self.store
    }

    /// Typed operation executor, for protocol adapters
    pub fn operations(&self) -> &OperationExecutor {
        &self.operations
    }

    /// Immutable pipeline configuration
    pub fn config(&self) -> &RagConfig {
        &self.config
    }
}

/// Log only the head of potentially long questions
fn truncate_for_log(question: &str) -> String {
    question.chars().take(100).collect()
}

//! Agentic orchestrator.
//!
//! Decomposes a question into sub-questions, fans them out to the
//! single-pass pipeline with bounded concurrency, merges and ranks the
//! retrieved sources, synthesizes a final answer, and emits a reasoning
//! trace. Any failure along the way degrades silently to a single-pass
//! answer on the original question.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use uuid::Uuid;

use crate::config::RagConfig;
use crate::errors::{RagError, Result};
use crate::pipeline::{ContextBuilder, QueryOptions, RagPipeline};
use crate::planner::QueryPlanner;
use crate::providers::{GenerationProvider, GenerationRequest};
use crate::types::{AgentResult, PipelineResult, SourceMatch, SubQueryResult};

/// Number of leading characters of content used as the dedup key
const DEDUP_PREFIX_CHARS: usize = 100;

const SYNTHESIS_SYSTEM_MESSAGE: &str = "\
You are an expert synthesis agent for a supply chain intelligence platform.
Your task is to combine information from multiple sub-analyses into a comprehensive, coherent answer.

Guidelines:
- Integrate insights from all sub-analyses
- Resolve any contradictions
- Provide a well-structured, complete answer
- Cite sources appropriately
- Maintain professional standards";

/// Multi-step orchestrator over the single-pass pipeline
pub struct AgentOrchestrator {
    pipeline: Arc<RagPipeline>,
    planner: QueryPlanner,
    generation: Arc<dyn GenerationProvider>,
    semaphore: Arc<Semaphore>,
    subquery_timeout: Duration,
    max_tokens: u32,
}

impl AgentOrchestrator {
    pub fn new(
        pipeline: Arc<RagPipeline>,
        generation: Arc<dyn GenerationProvider>,
        config: &RagConfig,
    ) -> Self {
        Self {
            pipeline,
            planner: QueryPlanner::new(Arc::clone(&generation)),
            generation,
            semaphore: Arc::new(Semaphore::new(config.agent.max_concurrent_subqueries.max(1))),
            subquery_timeout: config.agent.subquery_timeout(),
            max_tokens: config.generation.max_tokens,
        }
    }

    /// Process a question agentically.
    ///
    /// Failures in decomposition, sub-question execution, ranking, or
    /// synthesis are caught here and degrade to a single-pass answer on the
    /// original question with the original source budget; only a failure of
    /// that fallback surfaces to the caller.
    pub async fn process(&self, question: &str, options: &QueryOptions) -> Result<AgentResult> {
        match self.run_agentic(question, options).await {
            Ok(result) => Ok(result),
            Err(e) => {
                tracing::error!(error = %e, "agentic processing failed, degrading to single-pass");
                let fallback = self.pipeline.answer(question, options).await?;
                Ok(AgentResult {
                    answer: fallback.answer,
                    sources: fallback.sources,
                    reasoning: None,
                    sub_queries: Vec::new(),
                    conversation_id: fallback.conversation_id,
                })
            }
        }
    }

    async fn run_agentic(&self, question: &str, options: &QueryOptions) -> Result<AgentResult> {
        tracing::info!("processing query with planning");

        let sub_queries = self.planner.decompose(question).await;

        let (sub_results, pooled_sources) = self.execute_sub_queries(&sub_queries, options).await?;

        let unique_sources = deduplicate_sources(pooled_sources);
        let top_sources = rank_sources(unique_sources, options.max_sources);

        let answer = self
            .synthesize(question, &sub_results, &top_sources, options.temperature)
            .await?;
        let reasoning = build_reasoning_trace(&sub_queries);

        Ok(AgentResult {
            answer,
            sources: top_sources,
            reasoning: Some(reasoning),
            sub_queries,
            conversation_id: Uuid::new_v4().to_string(),
        })
    }

    /// Fan sub-questions out to the single-pass pipeline.
    ///
    /// Each sub-question runs as its own task under the concurrency bound
    /// and the per-call timeout; results are re-ordered by sub-question
    /// index regardless of completion order. Dropping the set on the first
    /// failure cancels the in-flight tasks and discards partial results.
    async fn execute_sub_queries(
        &self,
        sub_queries: &[String],
        options: &QueryOptions,
    ) -> Result<(Vec<SubQueryResult>, Vec<SourceMatch>)> {
        let per_query_sources = options.max_sources / sub_queries.len() + 1;
        let sub_options = QueryOptions {
            max_sources: per_query_sources,
            temperature: options.temperature,
            min_score: options.min_score,
            conversation_id: None,
        };

        let mut tasks: JoinSet<Result<(usize, String, PipelineResult)>> = JoinSet::new();
        for (index, sub_query) in sub_queries.iter().cloned().enumerate() {
            let pipeline = Arc::clone(&self.pipeline);
            let semaphore = Arc::clone(&self.semaphore);
            let timeout = self.subquery_timeout;
            let task_options = sub_options.clone();

            tasks.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|_| RagError::Internal("semaphore closed".to_string()))?;

                let result = tokio::time::timeout(timeout, pipeline.answer(&sub_query, &task_options))
                    .await
                    .map_err(|_| RagError::Timeout {
                        duration_ms: timeout.as_millis() as u64,
                    })??;

                Ok((index, sub_query, result))
            });
        }

        let mut by_index: Vec<Option<(String, PipelineResult)>> =
            sub_queries.iter().map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            let (index, sub_query, result) = joined
                .map_err(|e| RagError::Internal(format!("sub-question task failed: {}", e)))??;
            by_index[index] = Some((sub_query, result));
        }

        let mut sub_results = Vec::with_capacity(by_index.len());
        let mut pooled_sources = Vec::new();
        for entry in by_index {
            let (sub_query, result) = entry
                .ok_or_else(|| RagError::Internal("missing sub-question result".to_string()))?;
            pooled_sources.extend(result.sources);
            sub_results.push(SubQueryResult {
                query: sub_query,
                answer: result.answer,
            });
        }

        Ok((sub_results, pooled_sources))
    }

    /// Combine sub-answers and ranked sources into the final answer
    async fn synthesize(
        &self,
        question: &str,
        sub_results: &[SubQueryResult],
        sources: &[SourceMatch],
        temperature: f32,
    ) -> Result<String> {
        let sub_answers = sub_results
            .iter()
            .map(|r| format!("Sub-question: {}\nAnswer: {}", r.query, r.answer))
            .collect::<Vec<_>>()
            .join("\n\n");

        let prompt = format!(
            "Original Question: {}\n\nSub-Analysis Results:\n{}\n\nSupporting Sources:\n{}\n\n\
             Synthesize a comprehensive answer to the original question, integrating all insights.",
            question,
            sub_answers,
            ContextBuilder::context_block(sources)
        );

        let request = GenerationRequest::new(prompt)
            .with_system_message(SYNTHESIS_SYSTEM_MESSAGE)
            .with_temperature(temperature)
            .with_max_tokens(self.max_tokens);

        self.generation.generate(request).await
    }
}

/// Drop later sources whose content shares its first 100 characters with an
/// earlier one; first occurrence wins
fn deduplicate_sources(sources: Vec<SourceMatch>) -> Vec<SourceMatch> {
    let mut seen = HashSet::new();
    let mut unique = Vec::new();

    for source in sources {
        let key: String = source.content.chars().take(DEDUP_PREFIX_CHARS).collect();
        if seen.insert(key) {
            unique.push(source);
        }
    }

    unique
}

/// Sort by descending score and keep the top `max_sources`
fn rank_sources(mut sources: Vec<SourceMatch>, max_sources: usize) -> Vec<SourceMatch> {
    sources.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    sources.truncate(max_sources);
    sources
}

/// Templated, deterministic description of the steps taken; descriptive
/// text, not derived from actual branching
fn build_reasoning_trace(sub_queries: &[String]) -> String {
    let mut parts = vec![
        "**Reasoning Process:**".to_string(),
        format!(
            "\n1. Decomposed question into {} focused queries:",
            sub_queries.len()
        ),
    ];

    for (i, query) in sub_queries.iter().enumerate() {
        parts.push(format!("   - Sub-query {}: {}", i + 1, query));
    }

    parts.push("\n2. Retrieved and analyzed relevant information for each query".to_string());
    parts.push("\n3. Synthesized findings into comprehensive answer".to_string());
    parts.push("\n4. Verified consistency across sources".to_string());

    parts.join("\n")
}

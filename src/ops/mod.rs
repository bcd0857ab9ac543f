//! Typed operation dispatch.
//!
//! The operation surface exposed to protocol adapters: a closed set of
//! operation identifiers with validated parameter schemas. Requests
//! deserialize into `OpRequest`, so unknown operation names and malformed
//! parameters are rejected by construction instead of at dispatch time.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::RagConfig;
use crate::errors::Result;
use crate::providers::{GenerationProvider, GenerationRequest};
use crate::store::IndexedStore;
use crate::types::SourceMatch;

const ANALYSIS_TEMPERATURE: f32 = 0.5;
const ANALYSIS_SOURCES: usize = 7;
const INSIGHTS_TEMPERATURE: f32 = 0.6;

fn default_max_results() -> usize {
    5
}

/// How much context to retrieve for a topic
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextDepth {
    Shallow,
    #[default]
    Medium,
    Deep,
}

impl ContextDepth {
    /// Result budget for each depth
    fn max_results(self) -> usize {
        match self {
            Self::Shallow => 3,
            Self::Medium => 5,
            Self::Deep => 10,
        }
    }
}

/// Kind of insights to generate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightType {
    #[default]
    Trends,
    Risks,
    Opportunities,
}

impl InsightType {
    fn prompt_lead(self) -> &'static str {
        match self {
            Self::Trends => "Identify and analyze emerging trends in the following context:",
            Self::Risks => {
                "Identify potential risks and mitigation strategies in the following context:"
            }
            Self::Opportunities => {
                "Identify optimization opportunities and potential improvements in the following context:"
            }
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Trends => "trends",
            Self::Risks => "risks",
            Self::Opportunities => "opportunities",
        }
    }
}

/// Operation request, tagged by operation identifier
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum OpRequest {
    /// Semantic search over indexed documents
    SearchDocuments {
        query: String,
        #[serde(default = "default_max_results")]
        max_results: usize,
    },
    /// Aggregate relevant context for a topic
    RetrieveContext {
        topic: String,
        #[serde(default)]
        depth: ContextDepth,
    },
    /// Domain-specific supply chain analysis
    AnalyzeSupplyChain {
        query: String,
        #[serde(default)]
        focus_areas: Vec<String>,
    },
    /// AI-generated insights over caller-provided context
    GenerateInsights {
        context: String,
        #[serde(default)]
        insight_type: InsightType,
    },
}

/// Operation response, tagged to match the request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum OpResponse {
    SearchDocuments {
        results: Vec<SourceMatch>,
        count: usize,
    },
    RetrieveContext {
        topic: String,
        depth: ContextDepth,
        context: String,
        source_count: usize,
    },
    AnalyzeSupplyChain {
        query: String,
        focus_areas: Vec<String>,
        analysis: String,
        sources_analyzed: usize,
    },
    GenerateInsights {
        insight_type: InsightType,
        insights: String,
    },
}

/// Executes operations against the store and the generation provider
pub struct OperationExecutor {
    store: Arc<IndexedStore>,
    generation: Arc<dyn GenerationProvider>,
    min_score: f32,
    max_tokens: u32,
}

impl OperationExecutor {
    pub fn new(
        store: Arc<IndexedStore>,
        generation: Arc<dyn GenerationProvider>,
        config: &RagConfig,
    ) -> Self {
        Self {
            store,
            generation,
            min_score: config.retrieval.min_score,
            max_tokens: config.generation.max_tokens,
        }
    }

    /// Dispatch one operation to its handler
    pub async fn execute(&self, request: OpRequest) -> Result<OpResponse> {
        match request {
            OpRequest::SearchDocuments { query, max_results } => {
                self.search_documents(&query, max_results).await
            }
            OpRequest::RetrieveContext { topic, depth } => {
                self.retrieve_context(&topic, depth).await
            }
            OpRequest::AnalyzeSupplyChain { query, focus_areas } => {
                self.analyze_supply_chain(&query, focus_areas).await
            }
            OpRequest::GenerateInsights {
                context,
                insight_type,
            } => self.generate_insights(&context, insight_type).await,
        }
    }

    async fn search_documents(&self, query: &str, max_results: usize) -> Result<OpResponse> {
        tracing::info!(query, "operation: search_documents");

        let results = self
            .store
            .similarity_search(query, max_results, self.min_score)
            .await?;

        Ok(OpResponse::SearchDocuments {
            count: results.len(),
            results,
        })
    }

    async fn retrieve_context(&self, topic: &str, depth: ContextDepth) -> Result<OpResponse> {
        tracing::info!(topic, ?depth, "operation: retrieve_context");

        let results = self
            .store
            .similarity_search(topic, depth.max_results(), self.min_score)
            .await?;

        let context = results
            .iter()
            .map(|r| r.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        Ok(OpResponse::RetrieveContext {
            topic: topic.to_string(),
            depth,
            context,
            source_count: results.len(),
        })
    }

    async fn analyze_supply_chain(
        &self,
        query: &str,
        focus_areas: Vec<String>,
    ) -> Result<OpResponse> {
        tracing::info!(query, "operation: analyze_supply_chain");

        let results = self
            .store
            .similarity_search(query, ANALYSIS_SOURCES, self.min_score)
            .await?;
        let context = results
            .iter()
            .map(|r| r.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let system_message = "\
You are a supply chain analysis expert.
Provide structured, data-driven analysis focusing on:
- Key metrics and KPIs
- Risk assessment
- Optimization opportunities
- Actionable recommendations";

        let focus = if focus_areas.is_empty() {
            "General".to_string()
        } else {
            focus_areas.join(", ")
        };
        let prompt = format!(
            "Supply Chain Analysis Request:\nQuery: {}\nFocus Areas: {}\n\nRelevant Data:\n{}\n\n\
             Provide a structured analysis with clear insights and recommendations.",
            query, focus, context
        );

        let analysis = self
            .generation
            .generate(
                GenerationRequest::new(prompt)
                    .with_system_message(system_message)
                    .with_temperature(ANALYSIS_TEMPERATURE)
                    .with_max_tokens(self.max_tokens),
            )
            .await?;

        Ok(OpResponse::AnalyzeSupplyChain {
            query: query.to_string(),
            focus_areas,
            analysis,
            sources_analyzed: results.len(),
        })
    }

    async fn generate_insights(
        &self,
        context: &str,
        insight_type: InsightType,
    ) -> Result<OpResponse> {
        tracing::info!(insight_type = insight_type.label(), "operation: generate_insights");

        let system_message = format!(
            "You are a strategic insights analyst.\nGenerate {} insights that are:\n\
             - Data-driven and specific\n- Actionable with clear next steps\n\
             - Aligned with operational excellence",
            insight_type.label()
        );
        let prompt = format!(
            "{}\n\nContext:\n{}\n\nProvide 3-5 key insights with supporting evidence.",
            insight_type.prompt_lead(),
            context
        );

        let insights = self
            .generation
            .generate(
                GenerationRequest::new(prompt)
                    .with_system_message(system_message)
                    .with_temperature(INSIGHTS_TEMPERATURE)
                    .with_max_tokens(self.max_tokens),
            )
            .await?;

        Ok(OpResponse::GenerateInsights {
            insight_type,
            insights,
        })
    }
}

//! Query planner: decomposes a complex question into focused sub-questions.

use std::sync::Arc;

use crate::providers::{GenerationProvider, GenerationRequest};

/// Decomposition runs cool and short
const DECOMPOSE_TEMPERATURE: f32 = 0.3;
const DECOMPOSE_MAX_TOKENS: u32 = 500;

const DECOMPOSE_SYSTEM_MESSAGE: &str = "\
You are a query planning agent for a supply chain intelligence platform.
Your task is to analyze questions and break them down into focused sub-queries that can be answered independently.

Guidelines:
- Identify key aspects of the question
- Create 1-3 focused sub-queries
- Each sub-query should be specific and answerable
- If the question is already simple, return it as-is
- Format: Return ONLY a JSON array of sub-queries";

/// Decomposes questions via the generation provider
pub struct QueryPlanner {
    generation: Arc<dyn GenerationProvider>,
}

impl QueryPlanner {
    pub fn new(generation: Arc<dyn GenerationProvider>) -> Self {
        Self { generation }
    }

    /// Decompose a question into an ordered list of sub-questions.
    ///
    /// Always returns at least one entry: a provider failure, a non-JSON
    /// response, or an empty array all fall back to the original question
    /// unchanged. This is the designed degraded path, not an error.
    pub async fn decompose(&self, question: &str) -> Vec<String> {
        let prompt = format!(
            "Question: {}\n\nDecompose this into focused sub-queries. \
             Return ONLY a JSON array, for example:\n[\"sub-query 1\", \"sub-query 2\"]",
            question
        );

        let request = GenerationRequest::new(prompt)
            .with_system_message(DECOMPOSE_SYSTEM_MESSAGE)
            .with_temperature(DECOMPOSE_TEMPERATURE)
            .with_max_tokens(DECOMPOSE_MAX_TOKENS);

        let response = match self.generation.generate(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(error = %e, "question decomposition failed");
                return vec![question.to_string()];
            }
        };

        match Self::parse_sub_queries(&response) {
            Some(sub_queries) => {
                tracing::info!(count = sub_queries.len(), "decomposed question");
                sub_queries
            }
            None => {
                tracing::warn!("failed to parse sub-queries, using original question");
                vec![question.to_string()]
            }
        }
    }

    /// Parse a response as a non-empty JSON array of strings
    fn parse_sub_queries(response: &str) -> Option<Vec<String>> {
        let parsed: Vec<String> = serde_json::from_str(response.trim()).ok()?;
        if parsed.is_empty() {
            return None;
        }
        Some(parsed)
    }
}

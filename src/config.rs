//! Pipeline configuration.
//!
//! `RagConfig` is an immutable value constructed once at startup and passed
//! by reference into every component. Loading it from a file or the
//! environment is the embedding application's concern.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Top-level pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    /// Document chunking parameters
    pub chunking: ChunkingConfig,
    /// Retrieval parameters
    pub retrieval: RetrievalConfig,
    /// Generation parameters
    pub generation: GenerationConfig,
    /// Agentic fan-out parameters
    pub agent: AgentConfig,
    /// Classification label stamped into chunk metadata at indexing time
    pub data_classification: String,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunking: ChunkingConfig::default(),
            retrieval: RetrievalConfig::default(),
            generation: GenerationConfig::default(),
            agent: AgentConfig::default(),
            data_classification: "CONFIDENTIAL".to_string(),
        }
    }
}

/// Chunking parameters: window size and overlap in characters
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// Retrieval parameters
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Maximum number of sources returned to the caller
    pub max_sources: usize,
    /// Minimum similarity score for vector matches
    pub min_score: f32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            max_sources: 5,
            min_score: 0.7,
        }
    }
}

/// Generation parameters
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 4096,
        }
    }
}

/// Agentic fan-out parameters
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Upper bound on concurrently running sub-questions
    pub max_concurrent_subqueries: usize,
    /// Per-sub-question timeout in seconds
    pub subquery_timeout_secs: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_concurrent_subqueries: 3,
            subquery_timeout_secs: 60,
        }
    }
}

impl AgentConfig {
    /// Per-sub-question timeout as a `Duration`
    pub fn subquery_timeout(&self) -> Duration {
        Duration::from_secs(self.subquery_timeout_secs)
    }
}

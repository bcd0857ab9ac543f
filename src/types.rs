//! Shared data types: retrieval results, agentic results, and the
//! request/response contract exposed to calling layers.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A retrieved text fragment with its relevance score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceMatch {
    /// Chunk text
    pub content: String,
    /// Source label, the originating filename
    pub source: String,
    /// Relevance score; similarity-scale for vector matches, fixed 0.5 for
    /// keyword-fallback matches
    pub score: f32,
    /// Chunk metadata (classification, char_count, total_chunks, created_at)
    pub metadata: Map<String, Value>,
    /// Owning document id
    pub document_id: String,
}

/// Answer to one decomposed sub-question, transient within a single agentic
/// invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubQueryResult {
    pub query: String,
    pub answer: String,
}

/// Result of a single-pass pipeline call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResult {
    pub answer: String,
    pub sources: Vec<SourceMatch>,
    pub conversation_id: String,
}

/// Result of an agentic query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResult {
    pub answer: String,
    /// Deduplicated sources ranked by descending score
    pub sources: Vec<SourceMatch>,
    /// Templated reasoning trace; `None` when the orchestrator degraded to a
    /// single-pass answer
    pub reasoning: Option<String>,
    /// Sub-questions used; empty when degraded
    pub sub_queries: Vec<String>,
    pub conversation_id: String,
}

/// Administrative view of an indexed document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub document_id: String,
    pub filename: String,
    pub chunk_count: usize,
    pub metadata: Map<String, Value>,
}

/// Question request as received from the calling layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    pub question: String,
    #[serde(default = "default_use_agentic")]
    pub use_agentic: bool,
    #[serde(default = "default_max_sources")]
    pub max_sources: usize,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

fn default_use_agentic() -> bool {
    true
}

fn default_max_sources() -> usize {
    5
}

impl QueryRequest {
    /// Plain question with default routing and limits
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            use_agentic: default_use_agentic(),
            max_sources: default_max_sources(),
            temperature: None,
            conversation_id: None,
        }
    }
}

/// Answer response returned to the calling layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub answer: String,
    pub sources: Vec<SourceMatch>,
    pub conversation_id: String,
    pub model_used: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_reasoning: Option<String>,
}
